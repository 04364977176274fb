// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output.

use crate::prelude::*;

#[test]
fn help_lists_every_command() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("lint")
        .stdout_has("run")
        .stdout_has("show")
        .stdout_has("step-runner");
}

#[test]
fn run_help_shows_its_flags() {
    cli().args(&["run", "--help"]).passes().stdout_has("--auto-approve").stdout_has("--param");
}

#[test]
fn version_shows_the_package_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1.0");
}

#[test]
fn missing_command_is_a_usage_error() {
    cli().exits(2).stderr_has("Usage:");
}
