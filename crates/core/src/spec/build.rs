// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::step::{ToolInstall, WorkerRuntime};
use crate::types::{KeyVal, Repo, ServiceModule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildJobSpec {
    /// Registry images are pushed to; empty selects the default registry
    #[serde(default)]
    pub docker_registry_id: String,
    #[serde(default)]
    pub service_and_builds: Vec<ServiceAndBuild>,
}

/// One buildable service module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAndBuild {
    #[serde(flatten)]
    pub module: ServiceModule,
    #[serde(default)]
    pub build_name: String,
    /// Repository name of the produced image; defaults to the module name
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub repos: Vec<Repo>,
    #[serde(default)]
    pub key_vals: Vec<KeyVal>,
    #[serde(default)]
    pub build: BuildScript,
}

/// How a module is built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildScript {
    #[serde(default)]
    pub runtime: WorkerRuntime,
    #[serde(default)]
    pub installs: Vec<ToolInstall>,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub dockerfile: String,
    #[serde(default)]
    pub docker_context: String,
    #[serde(default)]
    pub build_args: String,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub timeout_mins: u64,
}
