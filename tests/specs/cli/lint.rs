// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cv lint` checks a definition without creating a task.

use crate::prelude::*;

#[test]
fn valid_definition_reports_ok() {
    let project = Project::nightly();
    project.cv().args(&["lint", "nightly.toml"]).passes().stdout_eq("ok: nightly (1 stages, 1 jobs)\n");
}

#[test]
fn lint_creates_no_task() {
    let project = Project::nightly();
    project.cv().args(&["lint", "nightly.toml"]).passes();
    project.cv().args(&["show", "nightly"]).passes().stdout_eq("No tasks for nightly\n");
}

#[test]
fn unknown_param_exits_with_invalid_code() {
    let project = Project::nightly();
    project
        .cv()
        .args(&["lint", "nightly.toml", "--param", "colour=red"])
        .exits(2)
        .stderr_has("nightly: unknown workflow parameter: colour")
        .stdout_eq("");
}

#[test]
fn malformed_param_is_a_usage_error() {
    let project = Project::nightly();
    project.cv().args(&["lint", "nightly.toml", "--param", "colour"]).exits(2).stderr_has("key=value");
}

#[test]
fn args_file_overrides_params() {
    let project = Project::nightly();
    project.file("args.json", r#"{"params": [{"key": "ghost", "value": "1"}]}"#);
    project
        .cv()
        .args(&["lint", "nightly.toml", "--args", "args.json"])
        .exits(2)
        .stderr_has("unknown workflow parameter: ghost");
}

#[test]
fn json_definition_is_accepted() {
    let project = Project::empty();
    project.file(
        "hello.json",
        r#"{
            "name": "hello",
            "stages": [{
                "name": "greet",
                "jobs": [{
                    "name": "say",
                    "type": "freestyle",
                    "spec": {
                        "runtime": {"infrastructure": "local"},
                        "steps": [{"name": "echo", "type": "shell", "script": "echo hi"}]
                    }
                }]
            }]
        }"#,
    );
    project.cv().args(&["lint", "hello.json"]).passes().stdout_eq("ok: hello (1 stages, 1 jobs)\n");
}

#[test]
fn missing_definition_fails() {
    let project = Project::empty();
    project.cv().args(&["lint", "absent.toml"]).exits(1).stderr_has("error: failed to read");
}
