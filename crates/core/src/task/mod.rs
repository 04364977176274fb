// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime task records: a workflow task owns stage tasks which own job tasks.
//!
//! Status changes go through the transition helpers here so that the
//! monotonicity rules of [`TaskStatus::can_transition_to`] hold everywhere.

mod spec;

pub use spec::{
    BlueGreenTaskSpec, CanaryTaskSpec, ClusterScope, ConfigTaskSpec, ContainerImage,
    DeployTaskSpec, FreestyleTaskSpec, GrayRollbackTaskSpec, GrayTarget, GrayTaskSpec,
    HelmTaskSpec, IssueTaskSpec, IssueTracker, JobTaskSpec, PatchTaskSpec, ResolvedPatch,
};

use crate::spec::JobType;
use crate::status::{ErrorPolicy, TaskStatus};
use crate::types::{Infrastructure, ServiceModule};
use crate::workflow::{ApprovalKind, WorkflowDefinition};
use serde::{Deserialize, Serialize};

/// A compiled, executable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTask {
    /// Slug of the key, safe as a resource or directory name
    pub name: String,
    /// Unique within the workflow task
    pub key: String,
    /// Name of the definition job this task was compiled from
    pub job_name: String,
    pub job_type: JobType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceModule>,
    pub spec: JobTaskSpec,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default)]
    pub infrastructure: Infrastructure,
    pub timeout_secs: u64,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
}

impl JobTask {
    /// Move to `status`, stamping start/end times. Returns false (and leaves
    /// the task untouched) when the transition would break monotonicity.
    pub fn transition(&mut self, status: TaskStatus, now: i64) -> bool {
        if self.status == status || !self.status.can_transition_to(status) {
            return false;
        }
        if status == TaskStatus::Running && self.start_time == 0 {
            self.start_time = now;
        }
        if status.is_terminal() {
            if self.start_time == 0 {
                self.start_time = now;
            }
            self.end_time = now;
        }
        self.status = status;
        true
    }

    /// Terminal failure with the error text recorded.
    pub fn fail(&mut self, error: impl Into<String>, now: i64) -> bool {
        self.finish_with(TaskStatus::Failed, error, now)
    }

    pub fn finish_with(&mut self, status: TaskStatus, error: impl Into<String>, now: i64) -> bool {
        if !self.transition(status, now) {
            return false;
        }
        self.error = error.into();
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Terminal but not Passed, under the continue policy.
    pub fn is_ignored_failure(&self) -> bool {
        self.error_policy == ErrorPolicy::Continue
            && self.status.is_terminal()
            && !self.status.is_passed()
    }
}

crate::builder! {
    pub struct JobTaskBuilder => JobTask {
        into {
            name: String = "job",
            key: String = "job",
            job_name: String = "job",
            error: String = "",
        }
        set {
            job_type: JobType = JobType::Freestyle,
            service: Option<ServiceModule> = None,
            spec: JobTaskSpec = JobTaskSpec::Freestyle(FreestyleTaskSpec::default()),
            status: TaskStatus = TaskStatus::Created,
            infrastructure: Infrastructure = Infrastructure::Local,
            timeout_secs: u64 = 600,
            outputs: Vec<String> = Vec::new(),
            error_policy: ErrorPolicy = ErrorPolicy::FailFast,
        }
        computed {
            start_time: i64 = 0,
            end_time: i64 = 0,
        }
    }
}

/// A recorded approval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub user: String,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    pub time: i64,
}

/// State of a stage's approval gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub kind: ApprovalKind,
    pub timeout_secs: u64,
    #[serde(default)]
    pub decisions: Vec<ApprovalDecision>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl ApprovalRecord {
    pub fn new(kind: ApprovalKind, timeout_secs: u64) -> Self {
        Self { kind, timeout_secs, decisions: Vec::new(), status: TaskStatus::Created }
    }

    /// Approvals required before the gate passes.
    pub fn needed(&self) -> usize {
        match &self.kind {
            ApprovalKind::Manual { approvers, needed_approvers } => {
                if *needed_approvers == 0 {
                    approvers.len().max(1)
                } else {
                    *needed_approvers
                }
            }
            ApprovalKind::Automatic => 0,
        }
    }

    pub fn approvals(&self) -> usize {
        self.decisions.iter().filter(|d| d.approved).count()
    }

    pub fn is_rejected(&self) -> bool {
        self.decisions.iter().any(|d| !d.approved)
    }

    pub fn has_decided(&self, user: &str) -> bool {
        self.decisions.iter().any(|d| d.user == user)
    }

    /// Whether `user` may decide on this gate. An empty approver list admits anyone.
    pub fn may_decide(&self, user: &str) -> bool {
        match &self.kind {
            ApprovalKind::Manual { approvers, .. } => {
                approvers.is_empty() || approvers.iter().any(|a| a == user)
            }
            ApprovalKind::Automatic => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageTask {
    pub name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalRecord>,
    #[serde(default)]
    pub jobs: Vec<JobTask>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
}

impl StageTask {
    pub fn transition(&mut self, status: TaskStatus, now: i64) -> bool {
        if self.status == status || !self.status.can_transition_to(status) {
            return false;
        }
        if matches!(status, TaskStatus::Running | TaskStatus::Waiting) && self.start_time == 0 {
            self.start_time = now;
        }
        if status.is_terminal() {
            self.end_time = now;
        }
        self.status = status;
        true
    }

    /// Status the stage resolves to from its jobs' statuses.
    ///
    /// Any non-terminal job keeps the stage Running. A fail-fast job that
    /// did not pass decides the outcome, and Failed/Timeout outrank Cancelled.
    pub fn aggregate(&self) -> TaskStatus {
        if self.jobs.iter().any(|j| !j.is_terminal()) {
            return TaskStatus::Running;
        }
        let mut cancelled = false;
        for job in &self.jobs {
            if job.error_policy == ErrorPolicy::Continue || job.status.is_passed() {
                continue;
            }
            if job.status == TaskStatus::Cancelled {
                cancelled = true;
                continue;
            }
            return job.status;
        }
        if cancelled {
            TaskStatus::Cancelled
        } else {
            TaskStatus::Passed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowTask {
    pub workflow_name: String,
    pub task_id: i64,
    #[serde(default)]
    pub revision: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub stages: Vec<StageTask>,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    #[serde(default)]
    pub task_creator: String,
    /// Definition frozen at creation with the run-time overlay applied
    pub origin_workflow_args: WorkflowDefinition,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl WorkflowTask {
    pub fn jobs(&self) -> impl Iterator<Item = &JobTask> {
        self.stages.iter().flat_map(|s| s.jobs.iter())
    }

    pub fn job(&self, key: &str) -> Option<&JobTask> {
        self.jobs().find(|j| j.key == key)
    }

    pub fn job_mut(&mut self, key: &str) -> Option<&mut JobTask> {
        self.stages.iter_mut().flat_map(|s| s.jobs.iter_mut()).find(|j| j.key == key)
    }

    pub fn stage(&self, name: &str) -> Option<&StageTask> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stage_mut(&mut self, name: &str) -> Option<&mut StageTask> {
        self.stages.iter_mut().find(|s| s.name == name)
    }

    /// Tasks compiled from the definition job named `job_name`.
    pub fn jobs_of<'a>(&'a self, job_name: &'a str) -> impl Iterator<Item = &'a JobTask> + 'a {
        self.jobs().filter(move |j| j.job_name == job_name)
    }

    pub fn transition(&mut self, status: TaskStatus, now: i64) -> bool {
        if self.status == status || !self.status.can_transition_to(status) {
            return false;
        }
        if status == TaskStatus::Running && self.start_time == 0 {
            self.start_time = now;
        }
        if status.is_terminal() {
            self.end_time = now;
        }
        self.status = status;
        true
    }

    /// Settle the task in a terminal `status`.
    ///
    /// Every non-terminal job is forced to Cancelled, stages that never
    /// started become Skipped, and stages still in flight take the final
    /// status of their jobs (or Cancelled).
    pub fn finish(&mut self, status: TaskStatus, now: i64) {
        for stage in &mut self.stages {
            let started = stage.status != TaskStatus::Created;
            for job in &mut stage.jobs {
                if !job.is_terminal() {
                    job.transition(TaskStatus::Cancelled, now);
                }
            }
            if !started {
                stage.transition(TaskStatus::Skipped, now);
            } else if !stage.status.is_terminal() {
                let settled = match stage.aggregate() {
                    TaskStatus::Passed | TaskStatus::Running => TaskStatus::Cancelled,
                    other => other,
                };
                stage.transition(settled, now);
            }
        }
        self.transition(status, now);
    }

    /// Jobs that failed under the continue policy. Non-empty on a Passed
    /// task means partial success.
    pub fn ignored_failures(&self) -> Vec<&JobTask> {
        self.jobs().filter(|j| j.is_ignored_failure()).collect()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
