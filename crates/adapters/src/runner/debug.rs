// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug pause points.
//!
//! A pause point is armed by creating a marker file named after its
//! position (`before` or `after`) in the job's debug directory. While the
//! marker exists the runner waits; removing it releases the job.

use cv_core::spec::{DebugPosition, Step, StepSpec};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEBUG_POLL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct DebugGate {
    dir: PathBuf,
    poll: Duration,
}

impl DebugGate {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), poll: DEBUG_POLL }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn marker(&self, position: DebugPosition) -> PathBuf {
        self.dir.join(position.to_string())
    }

    pub fn is_armed(&self, position: DebugPosition) -> bool {
        self.marker(position).exists()
    }

    pub fn arm(&self, position: DebugPosition) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.marker(position), b"")
    }

    pub fn release(&self, position: DebugPosition) -> std::io::Result<()> {
        match std::fs::remove_file(self.marker(position)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Wait until the pause point is released. Returns `false` if
    /// cancelled first.
    pub async fn wait(&self, position: DebugPosition, cancel: &CancellationToken) -> bool {
        let marker = self.marker(position);
        if !marker.exists() {
            return true;
        }
        tracing::info!(marker = %marker.display(), "paused at debug point");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.poll) => {
                    if !marker.exists() {
                        tracing::info!(%position, "debug point released");
                        return true;
                    }
                }
            }
        }
    }
}

/// Surround every shell step with `debug-before` and `debug-after` points.
pub fn with_debug_points(steps: &[Step]) -> Vec<Step> {
    let mut out = Vec::with_capacity(steps.len() * 3);
    for step in steps {
        if matches!(step.spec, StepSpec::Shell { .. }) {
            out.push(debug_point(DebugPosition::Before));
            out.push(step.clone());
            out.push(debug_point(DebugPosition::After));
        } else {
            out.push(step.clone());
        }
    }
    out
}

fn debug_point(position: DebugPosition) -> Step {
    Step::new(format!("debug-{}", position), StepSpec::Debug { position })
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
