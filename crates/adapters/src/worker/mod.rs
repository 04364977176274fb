// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workers execute freestyle job contexts somewhere: on this host, in a
//! Kubernetes pod, or on a remote VM agent.
//!
//! The controller starts a job, then polls the handle until the report is
//! terminal. `cancel` stops a running job; `cleanup` releases whatever the
//! worker created and is called once whatever the outcome.

mod agent;
mod local;
mod pod;

pub use agent::{AgentClient, AgentJob, AgentState, AgentStatus, AgentWorker, HttpAgentClient};
pub use local::LocalWorker;
pub use pod::{pod_name, PodWorker, CONTEXT_ENV, RUNNER_CONTAINER};

use crate::cluster::ClusterError;
use async_trait::async_trait;
use cv_core::spec::WorkerRuntime;
use cv_core::{Infrastructure, JobContext};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("failed to start job: {0}")]
    Start(String),
    #[error("unknown worker handle: {0}")]
    UnknownHandle(String),
    #[error("no worker configured for {0} infrastructure")]
    Unsupported(Infrastructure),
    #[error("agent request failed: {0}")]
    Agent(String),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Opaque id of a started job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerHandle(pub String);

impl fmt::Display for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl WorkerState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkerState::Running)
    }
}

cv_core::simple_display! {
    WorkerState {
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub state: WorkerState,
    pub log: String,
    pub error: String,
    pub outputs: BTreeMap<String, String>,
}

impl WorkerReport {
    pub fn running() -> Self {
        Self::new(WorkerState::Running)
    }

    pub fn new(state: WorkerState) -> Self {
        Self { state, log: String::new(), error: String::new(), outputs: BTreeMap::new() }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { error: error.into(), ..Self::new(WorkerState::Failed) }
    }
}

#[async_trait]
pub trait Worker: Send + Sync + 'static {
    async fn start(
        &self,
        ctx: &JobContext,
        runtime: &WorkerRuntime,
    ) -> Result<WorkerHandle, WorkerError>;

    async fn poll(&self, handle: &WorkerHandle) -> Result<WorkerReport, WorkerError>;

    async fn cancel(&self, handle: &WorkerHandle) -> Result<(), WorkerError>;

    async fn cleanup(&self, handle: &WorkerHandle) -> Result<(), WorkerError>;
}

/// One worker per infrastructure kind; unset kinds are unsupported.
#[derive(Clone, Default)]
pub struct Workers {
    kubernetes: Option<Arc<dyn Worker>>,
    vm: Option<Arc<dyn Worker>>,
    local: Option<Arc<dyn Worker>>,
}

impl Workers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every infrastructure kind to the same worker.
    pub fn uniform(worker: Arc<dyn Worker>) -> Self {
        Self { kubernetes: Some(worker.clone()), vm: Some(worker.clone()), local: Some(worker) }
    }

    pub fn with(mut self, infrastructure: Infrastructure, worker: Arc<dyn Worker>) -> Self {
        match infrastructure {
            Infrastructure::Kubernetes => self.kubernetes = Some(worker),
            Infrastructure::Vm => self.vm = Some(worker),
            Infrastructure::Local => self.local = Some(worker),
        }
        self
    }

    pub fn get(&self, infrastructure: Infrastructure) -> Result<Arc<dyn Worker>, WorkerError> {
        let worker = match infrastructure {
            Infrastructure::Kubernetes => &self.kubernetes,
            Infrastructure::Vm => &self.vm,
            Infrastructure::Local => &self.local,
        };
        worker.clone().ok_or(WorkerError::Unsupported(infrastructure))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use agent::FakeAgentClient;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorker, WorkerCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
