// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Default timeout for helm upgrades.
pub const HELM_TIMEOUT: Duration = Duration::from_secs(600);

/// Run a subprocess command with a timeout.
///
/// The child is killed when the timeout elapses (the command is spawned
/// with `kill_on_drop`).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!("{} timed out after {}s", description, timeout.as_secs())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Cancelled,
    Failed(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Cancelled => write!(f, "cancelled"),
            RunError::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

/// Run a command until it exits or `cancel` fires; cancellation kills the child.
pub async fn run_cancellable(
    mut cmd: Command,
    cancel: &CancellationToken,
    description: &str,
) -> Result<Output, RunError> {
    cmd.kill_on_drop(true);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(%description, "subprocess cancelled");
            Err(RunError::Cancelled)
        }
        result = cmd.output() => {
            result.map_err(|e| RunError::Failed(format!("{} failed: {}", description, e)))
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
