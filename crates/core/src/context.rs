// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The payload handed to a worker for one freestyle job task.

use crate::spec::Step;
use crate::types::{KeyVal, Registry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable naming the directory outputs are written to.
pub const OUTPUTS_DIR_ENV: &str = "CONVEYOR_OUTPUTS_DIR";

/// Everything a worker needs to execute a job task's steps.
///
/// `secret_envs` are exported to steps like `envs` but never logged; the
/// `Debug` impl redacts their values.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobContext {
    pub workflow_name: String,
    pub task_id: i64,
    pub job_key: String,
    /// Working directory, relative to the worker's root
    pub workspace: String,
    #[serde(default)]
    pub envs: Vec<KeyVal>,
    #[serde(default)]
    pub secret_envs: Vec<KeyVal>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Registries shell steps log in to
    #[serde(default)]
    pub registries: Vec<Registry>,
}

impl JobContext {
    /// All variables exported to steps, secrets included.
    pub fn all_envs(&self) -> impl Iterator<Item = &KeyVal> {
        self.envs.iter().chain(self.secret_envs.iter())
    }

    /// Secret values to mask in captured logs (registry passwords included).
    pub fn secret_values(&self) -> Vec<&str> {
        self.secret_envs
            .iter()
            .map(|kv| kv.value.as_str())
            .chain(self.registries.iter().map(|r| r.secret_key.as_str()))
            .filter(|v| !v.is_empty())
            .collect()
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secrets: Vec<String> =
            self.secret_envs.iter().map(|kv| format!("{}=<redacted>", kv.key)).collect();
        f.debug_struct("JobContext")
            .field("workflow_name", &self.workflow_name)
            .field("task_id", &self.task_id)
            .field("job_key", &self.job_key)
            .field("workspace", &self.workspace)
            .field("envs", &self.envs)
            .field("secret_envs", &secrets)
            .field("steps", &self.steps.len())
            .field("outputs", &self.outputs)
            .field("registries", &self.registries)
            .finish()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
