// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine config loading through `--config` and `CV_CONFIG`.

use crate::prelude::*;

#[test]
fn invalid_config_is_reported() {
    let project = Project::nightly();
    project.file("cv.toml", "poll_interval_ms = 0\n");
    project
        .cv()
        .args(&["--config", "cv.toml", "lint", "nightly.toml"])
        .exits(1)
        .stderr_has("poll_interval_ms must be positive");
}

#[test]
fn config_from_the_environment_is_used() {
    let project = Project::nightly();
    project.file("cv.toml", "unknown_key = true\n");
    project.cv().env("CV_CONFIG", "cv.toml").args(&["lint", "nightly.toml"]).exits(1);
}

#[test]
fn config_state_dir_holds_the_log_and_tasks() {
    let project = Project::nightly();
    let state = project.path().join("elsewhere");
    project.file("cv.toml", &format!("state_dir = {:?}\nnotify = false\n", state.display().to_string()));
    project.cv().args(&["--config", "cv.toml", "run", "nightly.toml"]).passes();

    assert!(state.join("tasks.zst").is_file());
    assert!(state.join("cv.log").is_file());
}
