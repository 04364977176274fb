// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definitions: the immutable, per-revision input to the engine.

use crate::spec::{JobSpec, JobType};
use crate::status::{ErrorPolicy, TaskStatus};
use crate::types::{KeyVal, Repo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default)]
    pub revision: i64,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub notify_ctls: Vec<NotifyCtl>,
}

impl WorkflowDefinition {
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.stages.iter().flat_map(|s| s.jobs.iter())
    }

    pub fn find_job(&self, name: &str) -> Option<&Job> {
        self.jobs().find(|j| j.name == name)
    }

    pub fn find_job_mut(&mut self, name: &str) -> Option<&mut Job> {
        self.stages.iter_mut().flat_map(|s| s.jobs.iter_mut()).find(|j| j.name == name)
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    #[default]
    String,
    Choice,
    Text,
    Repo,
}

/// A typed workflow parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_credential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<Repo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<Approval>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    #[serde(flatten)]
    pub kind: ApprovalKind,
    /// Minutes before an undecided gate rejects; zero uses the engine default
    #[serde(default)]
    pub timeout_mins: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalKind {
    Manual {
        #[serde(default)]
        approvers: Vec<String>,
        /// Approvals required to pass; zero means all approvers
        #[serde(default)]
        needed_approvers: usize,
    },
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    #[serde(flatten)]
    pub spec: JobSpec,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl Job {
    pub fn new(name: impl Into<String>, spec: JobSpec) -> Self {
        Self { name: name.into(), spec, error_policy: ErrorPolicy::default() }
    }

    pub fn job_type(&self) -> JobType {
        self.spec.job_type()
    }
}

/// Notification routing for status changes of a workflow task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotifyCtl {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub webhook_type: String,
    #[serde(default)]
    pub address: String,
    /// Statuses that trigger a notification; empty means terminal statuses
    #[serde(default)]
    pub notify_on: Vec<TaskStatus>,
}

impl NotifyCtl {
    pub fn wants(&self, status: TaskStatus) -> bool {
        if !self.enabled {
            return false;
        }
        if self.notify_on.is_empty() {
            status.is_terminal()
        } else {
            self.notify_on.contains(&status)
        }
    }
}

fn default_true() -> bool {
    true
}

/// Run-time overlay applied on top of a definition when a task is created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowArgs {
    #[serde(default)]
    pub params: Vec<KeyVal>,
    /// Jobs carrying run-time selections, matched to definition jobs by name
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
