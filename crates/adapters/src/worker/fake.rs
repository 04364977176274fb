// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted worker for controller tests.

use super::{Worker, WorkerError, WorkerHandle, WorkerReport, WorkerState};
use async_trait::async_trait;
use cv_core::spec::WorkerRuntime;
use cv_core::JobContext;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCall {
    Start { job_key: String },
    Cancel { handle: String },
    Cleanup { handle: String },
}

#[derive(Clone)]
struct Script {
    running_polls: usize,
    /// `None` keeps the job running forever
    outcome: Option<WorkerReport>,
}

impl Default for Script {
    fn default() -> Self {
        Self { running_polls: 0, outcome: Some(WorkerReport::new(WorkerState::Succeeded)) }
    }
}

#[derive(Default)]
struct FakeWorkerState {
    scripts: HashMap<String, Script>,
    start_errors: HashMap<String, WorkerError>,
    started: Vec<JobContext>,
    handles: HashMap<WorkerHandle, String>,
    polls: HashMap<WorkerHandle, usize>,
    cancelled: HashSet<WorkerHandle>,
    calls: Vec<WorkerCall>,
}

/// Jobs succeed on the first poll unless scripted otherwise by job key.
#[derive(Clone, Default)]
pub struct FakeWorker {
    inner: Arc<Mutex<FakeWorkerState>>,
}

impl FakeWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed_with(&self, job_key: &str, outputs: &[(&str, &str)]) {
        let mut report = WorkerReport::new(WorkerState::Succeeded);
        report.outputs =
            outputs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<BTreeMap<_, _>>();
        self.script(job_key).outcome = Some(report);
    }

    pub fn fail(&self, job_key: &str, error: &str) {
        self.script(job_key).outcome = Some(WorkerReport::failed(error));
    }

    /// Fail after writing some outputs.
    pub fn fail_with_outputs(&self, job_key: &str, error: &str, outputs: &[(&str, &str)]) {
        let mut report = WorkerReport::failed(error);
        report.outputs = outputs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.script(job_key).outcome = Some(report);
    }

    pub fn hang(&self, job_key: &str) {
        self.script(job_key).outcome = None;
    }

    /// Report `Running` this many times before the outcome.
    pub fn set_running_polls(&self, job_key: &str, polls: usize) {
        self.script(job_key).running_polls = polls;
    }

    pub fn fail_start(&self, job_key: &str, err: WorkerError) {
        self.inner.lock().start_errors.insert(job_key.to_string(), err);
    }

    pub fn started(&self) -> Vec<JobContext> {
        self.inner.lock().started.clone()
    }

    pub fn started_keys(&self) -> Vec<String> {
        self.inner.lock().started.iter().map(|c| c.job_key.clone()).collect()
    }

    pub fn calls(&self) -> Vec<WorkerCall> {
        self.inner.lock().calls.clone()
    }

    fn script(&self, job_key: &str) -> parking_lot::MappedMutexGuard<'_, Script> {
        parking_lot::MutexGuard::map(self.inner.lock(), |s| {
            s.scripts.entry(job_key.to_string()).or_default()
        })
    }
}

#[async_trait]
impl Worker for FakeWorker {
    async fn start(
        &self,
        ctx: &JobContext,
        _runtime: &WorkerRuntime,
    ) -> Result<WorkerHandle, WorkerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorkerCall::Start { job_key: ctx.job_key.clone() });
        if let Some(err) = inner.start_errors.remove(&ctx.job_key) {
            return Err(err);
        }
        let handle = WorkerHandle(format!("{}#{}", ctx.job_key, inner.started.len() + 1));
        inner.started.push(ctx.clone());
        inner.handles.insert(handle.clone(), ctx.job_key.clone());
        Ok(handle)
    }

    async fn poll(&self, handle: &WorkerHandle) -> Result<WorkerReport, WorkerError> {
        let mut inner = self.inner.lock();
        let job_key = inner
            .handles
            .get(handle)
            .cloned()
            .ok_or_else(|| WorkerError::UnknownHandle(handle.to_string()))?;
        if inner.cancelled.contains(handle) {
            return Ok(WorkerReport::new(WorkerState::Cancelled));
        }
        let script = inner.scripts.get(&job_key).cloned().unwrap_or_default();
        let polls = inner.polls.entry(handle.clone()).or_default();
        *polls += 1;
        if *polls <= script.running_polls {
            return Ok(WorkerReport::running());
        }
        Ok(script.outcome.unwrap_or_else(WorkerReport::running))
    }

    async fn cancel(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let mut inner = self.inner.lock();
        inner.calls.push(WorkerCall::Cancel { handle: handle.to_string() });
        inner.cancelled.insert(handle.clone());
        Ok(())
    }

    async fn cleanup(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        self.inner.lock().calls.push(WorkerCall::Cleanup { handle: handle.to_string() });
        Ok(())
    }
}
