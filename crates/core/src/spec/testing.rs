// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanning and testing jobs: scripted checks over one or more repositories.

use super::freestyle::FreestyleKind;
use super::step::{SonarSettings, ToolInstall, WorkerRuntime};
use super::TargetSource;
use crate::types::{KeyVal, Repo, ServiceTarget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanningJobSpec {
    #[serde(default)]
    pub kind: FreestyleKind,
    #[serde(default)]
    pub scannings: Vec<ScanningDef>,
    /// Service kind: applied once per service target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<ScanningDef>,
    #[serde(default)]
    pub source: TargetSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    #[serde(default)]
    pub services: Vec<ServiceTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanningDef {
    pub name: String,
    #[serde(default)]
    pub runtime: WorkerRuntime,
    #[serde(default)]
    pub repos: Vec<Repo>,
    #[serde(default)]
    pub installs: Vec<ToolInstall>,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub key_vals: Vec<KeyVal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sonar: Option<SonarSettings>,
    #[serde(default)]
    pub timeout_mins: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestingJobSpec {
    #[serde(default)]
    pub kind: FreestyleKind,
    #[serde(default)]
    pub tests: Vec<TestDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TestDef>,
    #[serde(default)]
    pub source: TargetSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from_job: String,
    #[serde(default)]
    pub services: Vec<ServiceTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestDef {
    pub name: String,
    #[serde(default)]
    pub runtime: WorkerRuntime,
    #[serde(default)]
    pub repos: Vec<Repo>,
    #[serde(default)]
    pub installs: Vec<ToolInstall>,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub key_vals: Vec<KeyVal>,
    /// Directory holding junit XML reports
    #[serde(default)]
    pub junit_dir: String,
    /// Paths archived as test artifacts
    #[serde(default)]
    pub archive_paths: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub timeout_mins: u64,
}
