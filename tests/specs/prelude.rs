// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers: a temp project with its own state dir and a fluent
//! wrapper over `assert_cmd`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use tempfile::TempDir;

/// A definition with one local shell job, parameterized by `target`.
pub const NIGHTLY: &str = r#"
name = "nightly"

[[params]]
name = "target"
value = "all"

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
script = "echo building {{.workflow.params.target}}"
"#;

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    /// A project holding [`NIGHTLY`] as `nightly.toml`.
    pub fn nightly() -> Self {
        let project = Self::empty();
        project.file("nightly.toml", NIGHTLY);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    pub fn file(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    /// `cv` running in this project with isolated state and fast polling.
    pub fn cv(&self) -> Cli {
        let mut cli = cli();
        cli.cmd
            .current_dir(self.path())
            .env("CV_STATE_DIR", self.state_dir())
            .env("CV_POLL_INTERVAL_MS", "20");
        cli
    }
}

pub fn cli() -> Cli {
    let mut cmd = assert_cmd::Command::cargo_bin("cv").unwrap();
    cmd.env_remove("CV_CONFIG")
        .env_remove("CV_STATE_DIR")
        .env_remove("CONVEYOR_JOB_CONTEXT")
        .env_remove("COLOR")
        .env("NO_COLOR", "1");
    Cli { cmd }
}

pub struct Cli {
    cmd: assert_cmd::Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn output(mut self) -> RunAssert {
        RunAssert { output: self.cmd.output().unwrap() }
    }

    pub fn passes(self) -> RunAssert {
        let run = self.output();
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout:\n{}\nstderr:\n{}",
            run.output.status,
            run.stdout(),
            run.stderr()
        );
        run
    }

    pub fn exits(self, code: i32) -> RunAssert {
        let run = self.output();
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "stdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout missing {:?}:\n{}", expected, stdout);
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(!stdout.contains(unexpected), "stdout has {:?}:\n{}", unexpected, stdout);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr missing {:?}:\n{}", expected, stderr);
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }
}
