// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::TargetSource;
use crate::types::KeyVal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeployJobSpec {
    pub env: String,
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    pub source: TargetSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    #[serde(default)]
    pub services: Vec<DeployService>,
    /// Do not wait for the rollout to become ready
    #[serde(default)]
    pub skip_check_run_status: bool,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeployService {
    pub service_name: String,
    /// Deployment to update; defaults to the service name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workload_name: String,
    #[serde(default)]
    pub modules: Vec<DeployModule>,
}

impl DeployService {
    pub fn workload(&self) -> &str {
        if self.workload_name.is_empty() {
            &self.service_name
        } else {
            &self.workload_name
        }
    }
}

/// A container (module) and the image it should run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeployModule {
    pub service_module: String,
    #[serde(default)]
    pub image: String,
    /// Helm value path for the image; defaults to `<module>.image`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_path: String,
}

impl DeployModule {
    pub fn helm_value_path(&self) -> String {
        if self.value_path.is_empty() {
            format!("{}.image", self.service_module)
        } else {
            self.value_path.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelmDeployJobSpec {
    pub env: String,
    #[serde(default)]
    pub source: TargetSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    #[serde(default)]
    pub releases: Vec<HelmRelease>,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelmRelease {
    pub service_name: String,
    /// Defaults to the service name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_name: String,
    pub chart: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_version: String,
    /// `--set` style overrides
    #[serde(default)]
    pub values: Vec<KeyVal>,
    #[serde(default)]
    pub modules: Vec<DeployModule>,
}

impl HelmRelease {
    pub fn release(&self) -> &str {
        if self.release_name.is_empty() {
            &self.service_name
        } else {
            &self.release_name
        }
    }
}
