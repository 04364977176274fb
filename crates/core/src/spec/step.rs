// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed freestyle steps.

use crate::types::{Infrastructure, Repo, ServiceModule};
use serde::{Deserialize, Serialize};

/// One named step of a freestyle job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(flatten)]
    pub spec: StepSpec,
}

impl Step {
    pub fn new(name: impl Into<String>, spec: StepSpec) -> Self {
        Self { name: name.into(), spec }
    }

    pub fn shell(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self::new(name, StepSpec::Shell { script: script.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    Git {
        #[serde(default)]
        repos: Vec<Repo>,
    },
    Shell {
        script: String,
    },
    Tools {
        #[serde(default)]
        installs: Vec<ToolInstall>,
    },
    DockerBuild {
        #[serde(default = "default_context")]
        context: String,
        #[serde(default = "default_dockerfile")]
        dockerfile: String,
        image: String,
        #[serde(default)]
        build_args: String,
        #[serde(default)]
        registry_id: String,
    },
    Archive {
        #[serde(default)]
        uploads: Vec<ArchiveUpload>,
        destination: String,
    },
    JunitReport {
        report_dir: String,
    },
    TarArchive {
        #[serde(default)]
        paths: Vec<String>,
        result_dir: String,
        file_name: String,
    },
    SonarCheck {
        #[serde(default)]
        settings: SonarSettings,
    },
    DistributeImage {
        #[serde(default)]
        source_registry_id: String,
        #[serde(default)]
        target_registry_id: String,
        #[serde(default)]
        targets: Vec<DistributeTarget>,
    },
    /// Pause point that blocks only while armed
    Debug {
        position: DebugPosition,
    },
}

impl StepSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            StepSpec::Git { .. } => "git",
            StepSpec::Shell { .. } => "shell",
            StepSpec::Tools { .. } => "tools",
            StepSpec::DockerBuild { .. } => "docker_build",
            StepSpec::Archive { .. } => "archive",
            StepSpec::JunitReport { .. } => "junit_report",
            StepSpec::TarArchive { .. } => "tar_archive",
            StepSpec::SonarCheck { .. } => "sonar_check",
            StepSpec::DistributeImage { .. } => "distribute_image",
            StepSpec::Debug { .. } => "debug",
        }
    }
}

fn default_context() -> String {
    ".".to_string()
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInstall {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveUpload {
    pub src: String,
    #[serde(default)]
    pub dest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SonarSettings {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub parameter: String,
    #[serde(default)]
    pub check_quality_gate: bool,
}

/// An image copied from one registry to another.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistributeTarget {
    #[serde(flatten)]
    pub module: ServiceModule,
    pub source_image: String,
    /// Tag in the target registry; keeps the source tag when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_tag: String,
    /// Resolved at compile time
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugPosition {
    Before,
    After,
}

crate::simple_display! {
    DebugPosition {
        Before => "before",
        After => "after",
    }
}

/// Where and on what image a freestyle-style job runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerRuntime {
    #[serde(default)]
    pub infrastructure: Infrastructure,
    /// Container image for pod workers
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Agent selector labels for VM workers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vm_labels: Vec<String>,
    /// Cluster for pod workers; empty means the local cluster
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_id: String,
}
