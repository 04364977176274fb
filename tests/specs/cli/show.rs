// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cv show` reads tasks back from the state dir.

use crate::prelude::*;

#[test]
fn lists_tasks_of_a_workflow() {
    let project = Project::nightly();
    project.cv().args(&["run", "nightly.toml", "--creator", "tester"]).passes();
    project.cv().args(&["run", "nightly.toml", "--creator", "tester"]).passes();

    let run = project.cv().args(&["show", "nightly"]).passes();
    let lines: Vec<String> = run.stdout().lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("#1"));
    assert!(lines[1].starts_with("#2"));
    assert!(lines.iter().all(|l| l.contains("passed") && l.ends_with("tester")));
}

#[test]
fn shows_one_task_in_detail() {
    let project = Project::nightly();
    project.cv().args(&["run", "nightly.toml"]).passes();

    project
        .cv()
        .args(&["show", "nightly", "1"])
        .passes()
        .stdout_has("nightly #1 passed")
        .stdout_has("compile  passed");
}

#[test]
fn json_list_is_an_array() {
    let project = Project::nightly();
    project.cv().args(&["run", "nightly.toml"]).passes();

    let run = project.cv().args(&["show", "nightly", "--format", "json"]).passes();
    let tasks: Vec<serde_json::Value> = serde_json::from_str(&run.stdout()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["status"], "passed");
}

#[test]
fn unknown_task_fails() {
    let project = Project::nightly();
    project.cv().args(&["show", "nightly", "9"]).exits(1).stderr_has("task nightly#9 not found");
}

#[test]
fn unknown_workflow_has_no_tasks() {
    let project = Project::empty();
    project.cv().args(&["show", "ghost"]).passes().stdout_eq("No tasks for ghost\n");
}
