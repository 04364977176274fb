// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use crate::config::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 3600;

/// Resolve state directory: CV_STATE_DIR > XDG_STATE_HOME/conveyor > ~/.local/state/conveyor
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("CV_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("conveyor"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/conveyor"))
}

/// Config file named by `CV_CONFIG`
pub fn config_path() -> Option<PathBuf> {
    std::env::var("CV_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Controller poll interval override
pub fn poll_interval() -> Option<Duration> {
    std::env::var("CV_POLL_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for jobs that set none
pub fn default_job_timeout_secs() -> Option<u64> {
    std::env::var("CV_DEFAULT_JOB_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok())
}

/// Timeout for approval gates that set none
pub fn approval_timeout_secs() -> Option<u64> {
    std::env::var("CV_APPROVAL_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok())
}

/// Image carrying the `cv` binary that pod workers copy into job pods
pub fn k8s_runner_image() -> Option<String> {
    std::env::var("CV_K8S_RUNNER_IMAGE").ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
