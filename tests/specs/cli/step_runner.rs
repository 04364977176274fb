// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cv step-runner` is the in-pod entrypoint: it reads a job context from
//! the environment and prints the job log followed by a report line.

use crate::prelude::*;

fn context(script: &str) -> String {
    serde_json::json!({
        "workflow_name": "nightly",
        "task_id": 1,
        "job_key": "compile",
        "workspace": "",
        "outputs": ["VERSION"],
        "steps": [{"name": "make", "type": "shell", "script": script}],
    })
    .to_string()
}

#[test]
fn prints_the_log_then_the_report() {
    let project = Project::empty();
    project
        .cv()
        .env("CONVEYOR_JOB_CONTEXT", context("echo hello; printf 1.2.3 > \"$CONVEYOR_OUTPUTS_DIR/VERSION\""))
        .args(&["step-runner", "--root", "job"])
        .passes()
        .stdout_eq(concat!(
            "==> make (shell)\n",
            "hello\n",
            "::conveyor-report::{\"outcome\":\"passed\",\"outputs\":{\"VERSION\":\"1.2.3\"}}\n",
        ));
    assert!(project.path().join("job/src").is_dir());
}

#[test]
fn failing_step_exits_non_zero_with_a_failed_report() {
    let project = Project::empty();
    project
        .cv()
        .env("CONVEYOR_JOB_CONTEXT", context("exit 3"))
        .args(&["step-runner", "--root", "job"])
        .exits(1)
        .stdout_has("::conveyor-report::{\"outcome\":\"failed\"");
}

#[test]
fn missing_context_fails() {
    let project = Project::empty();
    project
        .cv()
        .args(&["step-runner", "--root", "job"])
        .exits(1)
        .stderr_has("CONVEYOR_JOB_CONTEXT is not set");
}

#[test]
fn malformed_context_fails() {
    let project = Project::empty();
    project
        .cv()
        .env("CONVEYOR_JOB_CONTEXT", "{not json")
        .args(&["step-runner", "--root", "job"])
        .exits(1)
        .stderr_has("invalid job context");
}
