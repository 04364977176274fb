// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fully resolved specs carried by job tasks.
//!
//! Nothing in here references another job: the compiler has already
//! substituted upstream targets, images and parameters.

use crate::spec::{
    ApolloNamespace, IssueTransition, NacosData, RolloutTarget, Step, WorkerRuntime,
};
use crate::types::{GroupVersionKind, KeyVal, PatchStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum JobTaskSpec {
    Freestyle(FreestyleTaskSpec),
    Deploy(DeployTaskSpec),
    HelmDeploy(HelmTaskSpec),
    CanaryDeploy(CanaryTaskSpec),
    CanaryRelease(CanaryTaskSpec),
    BlueGreenDeploy(BlueGreenTaskSpec),
    BlueGreenRelease(BlueGreenTaskSpec),
    GrayRelease(GrayTaskSpec),
    GrayRollback(GrayRollbackTaskSpec),
    K8sPatch(PatchTaskSpec),
    IssueTransition(IssueTaskSpec),
    ConfigPublish(ConfigTaskSpec),
}

crate::simple_display! {
    JobTaskSpec {
        Freestyle(..) => "freestyle",
        Deploy(..) => "deploy",
        HelmDeploy(..) => "helm_deploy",
        CanaryDeploy(..) => "canary_deploy",
        CanaryRelease(..) => "canary_release",
        BlueGreenDeploy(..) => "blue_green_deploy",
        BlueGreenRelease(..) => "blue_green_release",
        GrayRelease(..) => "gray_release",
        GrayRollback(..) => "gray_rollback",
        K8sPatch(..) => "k8s_patch",
        IssueTransition(..) => "issue_transition",
        ConfigPublish(..) => "config_publish",
    }
}

/// Ordered steps executed by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FreestyleTaskSpec {
    pub runtime: WorkerRuntime,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub envs: Vec<KeyVal>,
    /// Registry ids logged in to before shell steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registries: Vec<String>,
}

/// Where in a cluster a k8s task acts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterScope {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env: String,
    pub cluster_id: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerImage {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeployTaskSpec {
    pub scope: ClusterScope,
    pub service_name: String,
    pub workload_name: String,
    pub containers: Vec<ContainerImage>,
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    pub skip_check_run_status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelmTaskSpec {
    pub scope: ClusterScope,
    pub service_name: String,
    pub release_name: String,
    pub chart: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_version: String,
    #[serde(default)]
    pub values: Vec<KeyVal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanaryTaskSpec {
    pub scope: ClusterScope,
    pub percentage: u32,
    pub targets: Vec<RolloutTarget>,
    /// Deterministic suffix shared by deploy and release of one canary
    pub name_suffix: String,
}

impl CanaryTaskSpec {
    pub fn canary_name(&self, workload: &str) -> String {
        format!("{}-canary-{}", workload, self.name_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlueGreenTaskSpec {
    pub scope: ClusterScope,
    pub targets: Vec<RolloutTarget>,
    /// Value of the version label on blue resources, `blue-<hash>`
    pub version: String,
}

impl BlueGreenTaskSpec {
    pub fn blue_name(&self, base: &str) -> String {
        format!("{}-{}", base, self.version)
    }
}

/// One workload of a gray rollout. `baseline_replicas` and `origin_image`
/// are captured by the first step and inherited by later ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrayTarget {
    pub workload_name: String,
    pub container_name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrayTaskSpec {
    pub scope: ClusterScope,
    pub gray_scale: u32,
    /// True for the step that starts the chain
    pub first_step: bool,
    pub targets: Vec<GrayTarget>,
    /// Deterministic suffix shared by every step of one chain
    #[serde(default)]
    pub name_suffix: String,
}

impl GrayTaskSpec {
    pub fn gray_name(&self, workload: &str) -> String {
        format!("{}-gray-{}", workload, self.name_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrayRollbackTaskSpec {
    pub scope: ClusterScope,
    pub workloads: Vec<String>,
}

/// A patch with parameters already rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedPatch {
    pub resource_name: String,
    pub gvk: GroupVersionKind,
    pub strategy: PatchStrategy,
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatchTaskSpec {
    pub scope: ClusterScope,
    pub items: Vec<ResolvedPatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueTracker {
    Jira,
    Meego,
}

crate::simple_display! {
    IssueTracker {
        Jira => "jira",
        Meego => "meego",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTaskSpec {
    pub tracker: IssueTracker,
    pub project_key: String,
    pub transitions: Vec<IssueTransition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "center", rename_all = "snake_case")]
pub enum ConfigTaskSpec {
    Nacos { namespace_id: String, datas: Vec<NacosData> },
    Apollo { namespaces: Vec<ApolloNamespace> },
}
