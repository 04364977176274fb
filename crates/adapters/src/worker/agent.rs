// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs jobs on remote VM agents.
//!
//! The agent service queues submitted contexts, hands them to an agent
//! whose labels match, and reports `(status, log, error, output bytes)`.
//! Output bytes are the JSON-encoded map of output values.

use super::{Worker, WorkerError, WorkerHandle, WorkerReport, WorkerState};
use async_trait::async_trait;
use cv_core::spec::WorkerRuntime;
use cv_core::JobContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentJob {
    pub context: JobContext,
    #[serde(default)]
    pub vm_labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Queued,
    Running,
    Passed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub status: AgentState,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub outputs: Vec<u8>,
}

#[async_trait]
pub trait AgentClient: Send + Sync + 'static {
    /// Queue a job; returns the agent service's job id.
    async fn submit(&self, job: &AgentJob) -> Result<String, WorkerError>;

    async fn status(&self, id: &str) -> Result<AgentStatus, WorkerError>;

    async fn cancel(&self, id: &str) -> Result<(), WorkerError>;
}

#[derive(Deserialize)]
struct Submitted {
    id: String,
}

/// [`AgentClient`] for the agent service's HTTP API.
pub struct HttpAgentClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl HttpAgentClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, WorkerError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WorkerError::Agent(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), token: token.into(), http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/jobs{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, WorkerError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| WorkerError::Agent(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::Agent(format!("{}: {}", status, body.trim())));
        }
        Ok(response)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn submit(&self, job: &AgentJob) -> Result<String, WorkerError> {
        let response = self.send(self.http.post(self.url("")).json(job)).await?;
        let submitted: Submitted =
            response.json().await.map_err(|e| WorkerError::Agent(format!("bad submit response: {}", e)))?;
        Ok(submitted.id)
    }

    async fn status(&self, id: &str) -> Result<AgentStatus, WorkerError> {
        let response = self.send(self.http.get(self.url(&format!("/{}", id)))).await?;
        response.json().await.map_err(|e| WorkerError::Agent(format!("bad status response: {}", e)))
    }

    async fn cancel(&self, id: &str) -> Result<(), WorkerError> {
        self.send(self.http.post(self.url(&format!("/{}/cancel", id)))).await?;
        Ok(())
    }
}

/// [`Worker`] over an [`AgentClient`]; handles are agent job ids.
pub struct AgentWorker {
    client: Arc<dyn AgentClient>,
}

impl AgentWorker {
    pub fn new(client: Arc<dyn AgentClient>) -> Self {
        Self { client }
    }
}

fn decode_outputs(bytes: &[u8]) -> Result<BTreeMap<String, String>, serde_json::Error> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_slice(bytes)
}

#[async_trait]
impl Worker for AgentWorker {
    async fn start(
        &self,
        ctx: &JobContext,
        runtime: &WorkerRuntime,
    ) -> Result<WorkerHandle, WorkerError> {
        let job = AgentJob { context: ctx.clone(), vm_labels: runtime.vm_labels.clone() };
        let id = self.client.submit(&job).await?;
        tracing::info!(agent_job = %id, job_key = %ctx.job_key, labels = ?runtime.vm_labels, "submitted job to agent");
        Ok(WorkerHandle(id))
    }

    async fn poll(&self, handle: &WorkerHandle) -> Result<WorkerReport, WorkerError> {
        let status = self.client.status(&handle.0).await?;
        let state = match status.status {
            AgentState::Queued | AgentState::Running => WorkerState::Running,
            AgentState::Passed => WorkerState::Succeeded,
            AgentState::Failed => WorkerState::Failed,
            AgentState::Cancelled => WorkerState::Cancelled,
        };
        let mut report =
            WorkerReport { state, log: status.log, error: status.error, outputs: BTreeMap::new() };
        if state.is_terminal() {
            match decode_outputs(&status.outputs) {
                Ok(outputs) => report.outputs = outputs,
                Err(e) => {
                    report.state = WorkerState::Failed;
                    report.error = format!("agent returned malformed outputs: {}", e);
                }
            }
        }
        Ok(report)
    }

    async fn cancel(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        self.client.cancel(&handle.0).await
    }

    async fn cleanup(&self, _handle: &WorkerHandle) -> Result<(), WorkerError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{AgentClient, AgentJob, AgentState, AgentStatus};
    use crate::worker::WorkerError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeAgentState {
        submitted: Vec<(String, AgentJob)>,
        statuses: HashMap<String, AgentStatus>,
        cancelled: Vec<String>,
        submit_error: Option<WorkerError>,
    }

    /// In-memory agent service. Jobs start queued; tests drive them with
    /// [`FakeAgentClient::set_status`].
    #[derive(Clone, Default)]
    pub struct FakeAgentClient {
        inner: Arc<Mutex<FakeAgentState>>,
    }

    impl FakeAgentClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn submitted(&self) -> Vec<(String, AgentJob)> {
            self.inner.lock().submitted.clone()
        }

        pub fn cancelled(&self) -> Vec<String> {
            self.inner.lock().cancelled.clone()
        }

        pub fn set_status(&self, id: &str, status: AgentStatus) {
            self.inner.lock().statuses.insert(id.to_string(), status);
        }

        pub fn fail_submit(&self, err: WorkerError) {
            self.inner.lock().submit_error = Some(err);
        }
    }

    #[async_trait]
    impl AgentClient for FakeAgentClient {
        async fn submit(&self, job: &AgentJob) -> Result<String, WorkerError> {
            let mut inner = self.inner.lock();
            if let Some(err) = inner.submit_error.take() {
                return Err(err);
            }
            let id = format!("agent-job-{}", inner.submitted.len() + 1);
            inner.submitted.push((id.clone(), job.clone()));
            inner.statuses.insert(
                id.clone(),
                AgentStatus { status: AgentState::Queued, log: String::new(), error: String::new(), outputs: vec![] },
            );
            Ok(id)
        }

        async fn status(&self, id: &str) -> Result<AgentStatus, WorkerError> {
            self.inner
                .lock()
                .statuses
                .get(id)
                .cloned()
                .ok_or_else(|| WorkerError::UnknownHandle(id.to_string()))
        }

        async fn cancel(&self, id: &str) -> Result<(), WorkerError> {
            let mut inner = self.inner.lock();
            inner.cancelled.push(id.to_string());
            if let Some(status) = inner.statuses.get_mut(id) {
                status.status = AgentState::Cancelled;
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAgentClient;

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
