// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-type job definitions.
//!
//! [`JobSpec`] is a closed sum over every job kind. Each variant carries its
//! own typed spec; there is no untyped blob anywhere in the model.

mod build;
mod deploy;
mod distribute;
mod freestyle;
mod integration;
mod patch;
mod rollout;
mod step;
mod testing;

pub use build::{BuildJobSpec, BuildScript, ServiceAndBuild};
pub use deploy::{DeployJobSpec, DeployModule, DeployService, HelmDeployJobSpec, HelmRelease};
pub use distribute::DistributeImageJobSpec;
pub use freestyle::{FreestyleJobSpec, FreestyleKind};
pub use integration::{
    ApolloJobSpec, ApolloNamespace, IssueTransition, JiraJobSpec, MeegoJobSpec, NacosData,
    NacosJobSpec, PluginDef, PluginJobSpec,
};
pub use patch::{PatchItem, PatchJobSpec};
pub use rollout::{
    BlueGreenDeployJobSpec, BlueGreenReleaseJobSpec, CanaryDeployJobSpec, CanaryReleaseJobSpec,
    GrayReleaseJobSpec, GrayRollbackJobSpec, RolloutLocation, RolloutTarget,
};
pub use step::{
    ArchiveUpload, DebugPosition, DistributeTarget, SonarSettings, Step, StepSpec, ToolInstall,
    WorkerRuntime,
};
pub use testing::{ScanningDef, ScanningJobSpec, TestDef, TestingJobSpec};

use serde::{Deserialize, Serialize};

/// Where a job gets its service targets from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// Selected when the workflow is started
    #[default]
    Runtime,
    /// Inherited from an upstream job named by `from_job`
    FromJob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec", rename_all = "snake_case")]
pub enum JobSpec {
    Build(BuildJobSpec),
    Deploy(DeployJobSpec),
    HelmDeploy(HelmDeployJobSpec),
    Freestyle(FreestyleJobSpec),
    Scanning(ScanningJobSpec),
    Testing(TestingJobSpec),
    K8sCanaryDeploy(CanaryDeployJobSpec),
    K8sCanaryRelease(CanaryReleaseJobSpec),
    K8sBlueGreenDeploy(BlueGreenDeployJobSpec),
    K8sBlueGreenRelease(BlueGreenReleaseJobSpec),
    K8sGrayRelease(GrayReleaseJobSpec),
    K8sGrayRollback(GrayRollbackJobSpec),
    K8sPatch(PatchJobSpec),
    Plugin(PluginJobSpec),
    Jira(JiraJobSpec),
    Nacos(NacosJobSpec),
    Apollo(ApolloJobSpec),
    MeegoTransition(MeegoJobSpec),
    DistributeImage(DistributeImageJobSpec),
}

/// Tag of a [`JobSpec`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Build,
    Deploy,
    HelmDeploy,
    Freestyle,
    Scanning,
    Testing,
    K8sCanaryDeploy,
    K8sCanaryRelease,
    K8sBlueGreenDeploy,
    K8sBlueGreenRelease,
    K8sGrayRelease,
    K8sGrayRollback,
    K8sPatch,
    Plugin,
    Jira,
    Nacos,
    Apollo,
    MeegoTransition,
    DistributeImage,
}

crate::simple_display! {
    JobType {
        Build => "build",
        Deploy => "deploy",
        HelmDeploy => "helm_deploy",
        Freestyle => "freestyle",
        Scanning => "scanning",
        Testing => "testing",
        K8sCanaryDeploy => "k8s_canary_deploy",
        K8sCanaryRelease => "k8s_canary_release",
        K8sBlueGreenDeploy => "k8s_blue_green_deploy",
        K8sBlueGreenRelease => "k8s_blue_green_release",
        K8sGrayRelease => "k8s_gray_release",
        K8sGrayRollback => "k8s_gray_rollback",
        K8sPatch => "k8s_patch",
        Plugin => "plugin",
        Jira => "jira",
        Nacos => "nacos",
        Apollo => "apollo",
        MeegoTransition => "meego_transition",
        DistributeImage => "distribute_image",
    }
}

impl JobSpec {
    pub fn job_type(&self) -> JobType {
        match self {
            JobSpec::Build(_) => JobType::Build,
            JobSpec::Deploy(_) => JobType::Deploy,
            JobSpec::HelmDeploy(_) => JobType::HelmDeploy,
            JobSpec::Freestyle(_) => JobType::Freestyle,
            JobSpec::Scanning(_) => JobType::Scanning,
            JobSpec::Testing(_) => JobType::Testing,
            JobSpec::K8sCanaryDeploy(_) => JobType::K8sCanaryDeploy,
            JobSpec::K8sCanaryRelease(_) => JobType::K8sCanaryRelease,
            JobSpec::K8sBlueGreenDeploy(_) => JobType::K8sBlueGreenDeploy,
            JobSpec::K8sBlueGreenRelease(_) => JobType::K8sBlueGreenRelease,
            JobSpec::K8sGrayRelease(_) => JobType::K8sGrayRelease,
            JobSpec::K8sGrayRollback(_) => JobType::K8sGrayRollback,
            JobSpec::K8sPatch(_) => JobType::K8sPatch,
            JobSpec::Plugin(_) => JobType::Plugin,
            JobSpec::Jira(_) => JobType::Jira,
            JobSpec::Nacos(_) => JobType::Nacos,
            JobSpec::Apollo(_) => JobType::Apollo,
            JobSpec::MeegoTransition(_) => JobType::MeegoTransition,
            JobSpec::DistributeImage(_) => JobType::DistributeImage,
        }
    }

    /// Upstream job this spec references, if any.
    pub fn from_job(&self) -> Option<&str> {
        let from = match self {
            JobSpec::Deploy(s) if s.source == TargetSource::FromJob => &s.from_job,
            JobSpec::HelmDeploy(s) if s.source == TargetSource::FromJob => &s.from_job,
            JobSpec::Freestyle(s) if s.source == TargetSource::FromJob => &s.from_job,
            JobSpec::Scanning(s) if s.source == TargetSource::FromJob => &s.from_job,
            JobSpec::Testing(s) if s.source == TargetSource::FromJob => &s.from_job,
            JobSpec::DistributeImage(s) if s.source == TargetSource::FromJob => &s.from_job,
            JobSpec::K8sCanaryRelease(s) => &s.from_job,
            JobSpec::K8sBlueGreenRelease(s) => &s.from_job,
            JobSpec::K8sGrayRelease(s) => &s.from_job,
            _ => return None,
        };
        if from.is_empty() {
            None
        } else {
            Some(from)
        }
    }

    /// Output names the job declares, before expansion.
    pub fn declared_outputs(&self) -> Vec<String> {
        match self {
            JobSpec::Build(s) => {
                let mut outputs = vec!["IMAGE".to_string()];
                for sb in &s.service_and_builds {
                    for out in &sb.build.outputs {
                        if !outputs.contains(out) {
                            outputs.push(out.clone());
                        }
                    }
                }
                outputs
            }
            JobSpec::Freestyle(s) => s.outputs.clone(),
            JobSpec::Testing(s) => {
                let mut outputs: Vec<String> = Vec::new();
                for t in s.tests.iter().chain(s.template.iter()) {
                    for out in &t.outputs {
                        if !outputs.contains(out) {
                            outputs.push(out.clone());
                        }
                    }
                }
                outputs
            }
            JobSpec::Plugin(s) => s.plugin.outputs.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
