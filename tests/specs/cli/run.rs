// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cv run` creates a task and drives it to completion in-process.

use crate::prelude::*;

const GATED: &str = r#"
name = "release"

[[stages]]
name = "build"

[[stages.jobs]]
name = "compile"
type = "freestyle"

[stages.jobs.spec]
runtime = { infrastructure = "local" }

[[stages.jobs.spec.steps]]
name = "make"
type = "shell"
script = "true"

[[stages]]
name = "ship"
approval = { kind = "manual", approvers = ["lead"] }

[[stages.jobs]]
name = "publish"
type = "freestyle"

[stages.jobs.spec]
runtime = { infrastructure = "local" }

[[stages.jobs.spec.steps]]
name = "push"
type = "shell"
script = "true"
"#;

#[test]
fn passing_task_exits_zero_and_prints_its_detail() {
    let project = Project::nightly();
    project
        .cv()
        .args(&["run", "nightly.toml", "--creator", "tester"])
        .passes()
        .stdout_has("nightly #1 passed")
        .stdout_has("by tester")
        .stdout_has("  build passed")
        .stdout_has("compile  passed")
        .stderr_has("created nightly#1");
}

#[test]
fn failing_job_exits_with_task_code() {
    let project = Project::empty();
    let broken = NIGHTLY.replace("name = \"nightly\"", "name = \"broken\"").replace("echo building", "exit 4 #");
    project.file("broken.toml", &broken);
    project
        .cv()
        .args(&["run", "broken.toml"])
        .exits(3)
        .stdout_has("broken #1 failed")
        .stdout_has("compile  failed");
}

#[test]
fn task_ids_increase_per_workflow() {
    let project = Project::nightly();
    project.cv().args(&["run", "nightly.toml"]).passes().stdout_has("nightly #1 passed");
    project.cv().args(&["run", "nightly.toml"]).passes().stdout_has("nightly #2 passed");
}

#[test]
fn invalid_arguments_create_no_task() {
    let project = Project::nightly();
    project.cv().args(&["run", "nightly.toml", "--param", "colour=red"]).exits(2);
    project.cv().args(&["show", "nightly"]).passes().stdout_eq("No tasks for nightly\n");
}

#[test]
fn json_format_prints_the_task_record() {
    let project = Project::nightly();
    let run = project.cv().args(&["run", "nightly.toml", "--format", "json"]).passes();
    let task: serde_json::Value = serde_json::from_str(&run.stdout()).unwrap();

    assert_eq!(task["workflow_name"], "nightly");
    assert_eq!(task["task_id"], 1);
    assert_eq!(task["status"], "passed");
    assert_eq!(task["stages"][0]["jobs"][0]["status"], "passed");
}

#[test]
fn auto_approve_passes_manual_gates() {
    let project = Project::empty();
    project.file("release.toml", GATED);
    project
        .cv()
        .args(&["run", "release.toml", "--auto-approve"])
        .passes()
        .stdout_has("release #1 passed")
        .stdout_has("approval passed (1/1 approvals)")
        .stdout_has("auto approved");
}

#[test]
fn unanswered_gate_times_out_as_rejected() {
    let project = Project::empty();
    project.file("release.toml", GATED);
    project
        .cv()
        .env("CV_APPROVAL_TIMEOUT_SECS", "1")
        .args(&["run", "release.toml"])
        .exits(3)
        .stdout_has("release #1 rejected")
        .stdout_has("error: approval timed out")
        .stdout_lacks("publish  passed");
}
