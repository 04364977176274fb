// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::step::{Step, WorkerRuntime};
use super::TargetSource;
use crate::types::{KeyVal, ServiceTarget};
use serde::{Deserialize, Serialize};

/// Whether a freestyle-style job runs once or once per service module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreestyleKind {
    #[default]
    Normal,
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FreestyleJobSpec {
    #[serde(default)]
    pub kind: FreestyleKind,
    #[serde(default)]
    pub runtime: WorkerRuntime,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub envs: Vec<KeyVal>,
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Service kind only: where the service list comes from
    #[serde(default)]
    pub source: TargetSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    /// Service kind only: selected services with per-service repo/variable overrides
    #[serde(default)]
    pub services: Vec<ServiceTarget>,
    /// Minutes; zero uses the engine default
    #[serde(default)]
    pub timeout_mins: u64,
}
