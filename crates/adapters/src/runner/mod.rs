// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step runner: executes a [`JobContext`]'s steps on the current host.
//!
//! Used directly by the local worker and, through `cv step-runner`, as the
//! entrypoint inside worker pods. Each job gets its own directory tree:
//!
//! ```text
//! <root>/src        working directory for every step
//! <root>/outputs    one file per output, named after it
//! <root>/artifacts  archive, junit and tar results
//! <root>/debug      armed debug point markers
//! ```

mod debug;
mod mask;
mod script;

pub use debug::{with_debug_points, DebugGate, DEBUG_POLL};
pub use mask::{Masker, MASK};
pub use script::{
    is_shell_name, registry_password_env, shell_quote, step_script, ARTIFACTS_DIR_ENV,
    IMAGE_OUTPUT, WORKSPACE_ENV,
};

use crate::subprocess::{run_cancellable, RunError};
use cv_core::spec::{StepSpec, ToolInstall};
use cv_core::{JobContext, OUTPUTS_DIR_ENV};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Prefix of the log line carrying a serialized [`RunReport`].
pub const REPORT_MARKER: &str = "::conveyor-report::";

#[derive(Debug, Clone)]
pub struct RunDirs {
    pub root: PathBuf,
    pub workspace: PathBuf,
    pub outputs: PathBuf,
    pub artifacts: PathBuf,
    pub debug: PathBuf,
}

impl RunDirs {
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            workspace: root.join("src"),
            outputs: root.join("outputs"),
            artifacts: root.join("artifacts"),
            debug: root.join("debug"),
            root,
        }
    }

    /// Create the tree. Outputs left by an earlier run are discarded.
    pub fn create(&self) -> std::io::Result<()> {
        match std::fs::remove_dir_all(&self.outputs) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }
        for dir in [&self.workspace, &self.outputs, &self.artifacts, &self.debug] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    #[default]
    Passed,
    Failed,
    Cancelled,
}

cv_core::simple_display! {
    RunOutcome {
        Passed => "passed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Result of running all steps of a job. `log` is already masked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
    #[serde(skip)]
    pub log: String,
}

impl RunReport {
    pub fn failed(error: impl Into<String>) -> Self {
        Self { outcome: RunOutcome::Failed, error: error.into(), ..Self::default() }
    }

    /// Single log line carrying outcome, error and outputs.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        Ok(format!("{}{}", REPORT_MARKER, serde_json::to_string(self)?))
    }

    /// Last report line in `log`, with the preceding text as its log.
    pub fn from_log(log: &str) -> Option<RunReport> {
        let start = log
            .rfind(&format!("\n{}", REPORT_MARKER))
            .map(|i| i + 1)
            .or_else(|| log.starts_with(REPORT_MARKER).then_some(0))?;
        let line = log[start..].lines().next()?;
        let mut report: RunReport = serde_json::from_str(line.strip_prefix(REPORT_MARKER)?).ok()?;
        report.log = log[..start].to_string();
        Some(report)
    }
}

/// Runs steps in a [`RunDirs`] tree.
#[derive(Debug, Clone)]
pub struct StepRunner {
    dirs: RunDirs,
    tools_dir: Option<PathBuf>,
    debug_poll: Duration,
}

impl StepRunner {
    pub fn new(dirs: RunDirs) -> Self {
        Self { dirs, tools_dir: None, debug_poll: DEBUG_POLL }
    }

    /// Directory of pre-installed tools laid out as `<name>/<version>/bin`.
    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = Some(dir.into());
        self
    }

    pub fn with_debug_poll(mut self, poll: Duration) -> Self {
        self.debug_poll = poll;
        self
    }

    pub fn dirs(&self) -> &RunDirs {
        &self.dirs
    }

    pub fn debug_gate(&self) -> DebugGate {
        DebugGate::new(&self.dirs.debug).with_poll(self.debug_poll)
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// Outputs are collected whatever the outcome, so values written before
    /// a failure are reported.
    pub async fn run(&self, ctx: &JobContext, cancel: &CancellationToken) -> RunReport {
        if let Err(e) = self.dirs.create() {
            return RunReport::failed(format!(
                "failed to prepare {}: {}",
                self.dirs.root.display(),
                e
            ));
        }
        let masker = Masker::new(ctx.secret_values());
        let gate = self.debug_gate();
        let mut report = RunReport::default();
        let mut tool_paths: Vec<PathBuf> = Vec::new();

        for step in with_debug_points(&ctx.steps) {
            if cancel.is_cancelled() {
                report.outcome = RunOutcome::Cancelled;
                break;
            }
            match &step.spec {
                StepSpec::Debug { position } => {
                    if gate.is_armed(*position) {
                        let _ = writeln!(report.log, "==> {} (paused)", step.name);
                    }
                    if !gate.wait(*position, cancel).await {
                        report.outcome = RunOutcome::Cancelled;
                        break;
                    }
                    continue;
                }
                StepSpec::Tools { installs } => {
                    let _ = writeln!(report.log, "==> {} (tools)", step.name);
                    for install in installs {
                        self.resolve_tool(install, &mut tool_paths, &mut report.log);
                    }
                    continue;
                }
                _ => {}
            }
            let Some(script) = step_script(&step.spec, ctx) else {
                continue;
            };
            let _ = writeln!(report.log, "==> {} ({})", step.name, step.spec.kind());
            tracing::debug!(job_key = %ctx.job_key, step = %step.name, "running step");

            let cmd = self.command(script, ctx, &tool_paths);
            match run_cancellable(cmd, cancel, &format!("step {}", step.name)).await {
                Err(RunError::Cancelled) => {
                    report.outcome = RunOutcome::Cancelled;
                    break;
                }
                Err(RunError::Failed(msg)) => {
                    report.outcome = RunOutcome::Failed;
                    report.error = masker.mask(&msg);
                    break;
                }
                Ok(output) => {
                    report.log.push_str(&masker.mask(&String::from_utf8_lossy(&output.stdout)));
                    report.log.push_str(&masker.mask(&String::from_utf8_lossy(&output.stderr)));
                    if !output.status.success() {
                        report.outcome = RunOutcome::Failed;
                        report.error =
                            format!("step {} failed: {}", step.name, exit_description(output.status));
                        break;
                    }
                }
            }
        }

        report.outputs = collect_outputs(&self.dirs.outputs, &ctx.outputs);
        tracing::info!(
            workflow = %ctx.workflow_name,
            task_id = ctx.task_id,
            job_key = %ctx.job_key,
            outcome = %report.outcome,
            outputs = report.outputs.len(),
            "steps finished"
        );
        report
    }

    fn command(&self, script: String, ctx: &JobContext, tool_paths: &[PathBuf]) -> Command {
        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(script).current_dir(&self.dirs.workspace).stdin(Stdio::null());
        for kv in ctx.all_envs() {
            cmd.env(&kv.key, &kv.value);
        }
        for (index, registry) in ctx.registries.iter().enumerate() {
            cmd.env(registry_password_env(index), &registry.secret_key);
        }
        cmd.env(OUTPUTS_DIR_ENV, &self.dirs.outputs)
            .env(ARTIFACTS_DIR_ENV, &self.dirs.artifacts)
            .env(WORKSPACE_ENV, &self.dirs.workspace);
        if !tool_paths.is_empty() {
            let inherited = std::env::var_os("PATH").unwrap_or_default();
            let paths = tool_paths.iter().cloned().chain(std::env::split_paths(&inherited));
            if let Ok(joined) = std::env::join_paths(paths) {
                cmd.env("PATH", joined);
            }
        }
        cmd
    }

    fn resolve_tool(&self, install: &ToolInstall, paths: &mut Vec<PathBuf>, log: &mut String) {
        let found = self.tools_dir.as_ref().map(|root| tool_bin(root, install)).filter(|b| b.is_dir());
        match found {
            Some(bin) => {
                let _ = writeln!(log, "using {} from {}", install.name, bin.display());
                paths.insert(0, bin);
            }
            None => {
                let _ = writeln!(log, "{} {}: not preinstalled, using PATH", install.name, install.version);
            }
        }
    }
}

fn tool_bin(root: &Path, install: &ToolInstall) -> PathBuf {
    let mut dir = root.join(&install.name);
    if !install.version.is_empty() {
        dir.push(&install.version);
    }
    dir.join("bin")
}

fn exit_description(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Read each declared output that was written to `dir`.
fn collect_outputs(dir: &Path, names: &[String]) -> BTreeMap<String, String> {
    names
        .iter()
        .filter(|name| is_shell_name(name))
        .filter_map(|name| {
            std::fs::read_to_string(dir.join(name)).ok().map(|value| (name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
