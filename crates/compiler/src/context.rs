// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit inputs to compilation: registries, environments, entitlements.

use cv_core::{Environment, Registry};
use serde::{Deserialize, Serialize};

/// License-gated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Running jobs on remote VM agents
    VmInfrastructure,
    Meego,
    Apollo,
    Nacos,
}

cv_core::simple_display! {
    Feature {
        VmInfrastructure => "vm infrastructure",
        Meego => "meego",
        Apollo => "apollo",
        Nacos => "nacos",
    }
}

/// Everything the compiler may consult besides the definition itself.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    pub workflow_name: String,
    pub task_id: i64,
    pub registries: Vec<Registry>,
    pub environments: Vec<Environment>,
    pub features: Vec<Feature>,
    pub default_timeout_secs: u64,
    /// Image used by pod workers when a job names none
    pub default_image: String,
}

impl CompileContext {
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            default_timeout_secs: 3600,
            ..Self::default()
        }
    }

    cv_core::setters! {
        into {
            default_image: String,
        }
        set {
            task_id: i64,
            registries: Vec<Registry>,
            environments: Vec<Environment>,
            features: Vec<Feature>,
            default_timeout_secs: u64,
        }
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Registry by id; an empty id selects the default registry.
    pub fn registry(&self, id: &str) -> Option<&Registry> {
        if id.is_empty() {
            self.default_registry()
        } else {
            self.registries.iter().find(|r| r.id == id)
        }
    }

    pub fn default_registry(&self) -> Option<&Registry> {
        self.registries.iter().find(|r| r.is_default).or_else(|| self.registries.first())
    }

    pub fn environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }

    /// Job timeout in seconds; zero minutes selects the default.
    pub fn timeout_secs(&self, mins: u64) -> u64 {
        if mins == 0 {
            self.default_timeout_secs
        } else {
            mins.saturating_mul(60)
        }
    }
}
