// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canary, blue-green and gray rollout job definitions.

use serde::{Deserialize, Serialize};

/// A deployment container to roll a new image onto.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RolloutTarget {
    pub workload_name: String,
    pub container_name: String,
    #[serde(default)]
    pub image: String,
    /// Service fronting the workload (blue-green only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub k8s_service_name: String,
}

/// Where a rollout happens: an explicit cluster/namespace or a named environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RolloutLocation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanaryDeployJobSpec {
    #[serde(flatten)]
    pub location: RolloutLocation,
    /// Share of the origin replicas the canary runs with
    pub percentage: u32,
    #[serde(default)]
    pub targets: Vec<RolloutTarget>,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanaryReleaseJobSpec {
    pub from_job: String,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlueGreenDeployJobSpec {
    #[serde(flatten)]
    pub location: RolloutLocation,
    #[serde(default)]
    pub targets: Vec<RolloutTarget>,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlueGreenReleaseJobSpec {
    pub from_job: String,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrayReleaseJobSpec {
    /// Originating gray job of this chain; empty for the first step
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    #[serde(flatten)]
    pub location: RolloutLocation,
    /// Percentage of the baseline replicas served by the gray deployment
    pub gray_scale: u32,
    #[serde(default)]
    pub targets: Vec<RolloutTarget>,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrayRollbackJobSpec {
    #[serde(flatten)]
    pub location: RolloutLocation,
    #[serde(default)]
    pub workloads: Vec<String>,
    #[serde(default)]
    pub timeout_mins: u64,
}
