// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin, issue-tracker and config-center jobs.

use super::step::WorkerRuntime;
use crate::types::KeyVal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PluginJobSpec {
    pub plugin: PluginDef,
    #[serde(default)]
    pub runtime: WorkerRuntime,
    #[serde(default)]
    pub timeout_mins: u64,
}

/// A reusable containerized step with typed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PluginDef {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub image: String,
    pub script: String,
    #[serde(default)]
    pub inputs: Vec<KeyVal>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JiraJobSpec {
    pub project_key: String,
    #[serde(default)]
    pub issues: Vec<IssueTransition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeegoJobSpec {
    pub project_key: String,
    #[serde(default)]
    pub work_items: Vec<IssueTransition>,
}

/// Move an issue (or work item) to a target state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueTransition {
    pub id: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NacosJobSpec {
    pub namespace_id: String,
    #[serde(default)]
    pub datas: Vec<NacosData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NacosData {
    pub data_id: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub format: String,
    pub content: String,
}

fn default_group() -> String {
    "DEFAULT_GROUP".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApolloJobSpec {
    #[serde(default)]
    pub namespaces: Vec<ApolloNamespace>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApolloNamespace {
    pub app_id: String,
    pub env: String,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    pub namespace: String,
    #[serde(default)]
    pub kvs: Vec<KeyVal>,
}

fn default_cluster() -> String {
    "default".to_string()
}
