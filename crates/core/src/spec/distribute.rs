// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::step::{DistributeTarget, WorkerRuntime};
use super::TargetSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistributeImageJobSpec {
    #[serde(default)]
    pub source_registry_id: String,
    pub target_registry_id: String,
    #[serde(default)]
    pub source: TargetSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    #[serde(default)]
    pub targets: Vec<DistributeTarget>,
    #[serde(default)]
    pub runtime: WorkerRuntime,
    #[serde(default)]
    pub timeout_mins: u64,
}
