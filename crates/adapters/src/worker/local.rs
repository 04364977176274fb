// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs jobs on the engine's own host with the step runner.

use super::{Worker, WorkerError, WorkerHandle, WorkerReport, WorkerState};
use crate::runner::{RunDirs, RunOutcome, RunReport, StepRunner};
use async_trait::async_trait;
use cv_core::spec::WorkerRuntime;
use cv_core::JobContext;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct LocalJob {
    dir: PathBuf,
    cancel: CancellationToken,
    task: Option<JoinHandle<RunReport>>,
    report: Option<RunReport>,
}

/// Each job runs in `<root>/<workspace>` on a spawned tokio task.
pub struct LocalWorker {
    root: PathBuf,
    tools_dir: Option<PathBuf>,
    jobs: Arc<Mutex<HashMap<WorkerHandle, LocalJob>>>,
}

impl LocalWorker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), tools_dir: None, jobs: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = Some(dir.into());
        self
    }

    /// Directory a job runs in. Absolute or escaping workspaces are refused.
    pub fn job_dir(&self, ctx: &JobContext) -> Result<PathBuf, WorkerError> {
        let relative = if ctx.workspace.is_empty() {
            PathBuf::from(&ctx.workflow_name).join(ctx.task_id.to_string()).join(&ctx.job_key)
        } else {
            PathBuf::from(&ctx.workspace)
        };
        if !is_contained(&relative) {
            return Err(WorkerError::Start(format!(
                "workspace {} must be a relative path inside the worker root",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn is_contained(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn to_worker_report(report: &RunReport) -> WorkerReport {
    let state = match report.outcome {
        RunOutcome::Passed => WorkerState::Succeeded,
        RunOutcome::Failed => WorkerState::Failed,
        RunOutcome::Cancelled => WorkerState::Cancelled,
    };
    WorkerReport {
        state,
        log: report.log.clone(),
        error: report.error.clone(),
        outputs: report.outputs.clone(),
    }
}

#[async_trait]
impl Worker for LocalWorker {
    async fn start(
        &self,
        ctx: &JobContext,
        _runtime: &WorkerRuntime,
    ) -> Result<WorkerHandle, WorkerError> {
        let dir = self.job_dir(ctx)?;
        let handle = WorkerHandle(format!("{}/{}/{}", ctx.workflow_name, ctx.task_id, ctx.job_key));
        if self.jobs.lock().contains_key(&handle) {
            return Err(WorkerError::Start(format!("job {} already running", handle)));
        }

        let mut runner = StepRunner::new(RunDirs::under(&dir));
        if let Some(tools) = &self.tools_dir {
            runner = runner.with_tools_dir(tools);
        }
        let cancel = CancellationToken::new();
        let task = {
            let ctx = ctx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { runner.run(&ctx, &cancel).await })
        };
        tracing::info!(%handle, dir = %dir.display(), "started local job");
        self.jobs
            .lock()
            .insert(handle.clone(), LocalJob { dir, cancel, task: Some(task), report: None });
        Ok(handle)
    }

    async fn poll(&self, handle: &WorkerHandle) -> Result<WorkerReport, WorkerError> {
        let finished = {
            let mut jobs = self.jobs.lock();
            let job = jobs
                .get_mut(handle)
                .ok_or_else(|| WorkerError::UnknownHandle(handle.to_string()))?;
            if let Some(report) = &job.report {
                return Ok(to_worker_report(report));
            }
            if !job.task.as_ref().is_some_and(|t| t.is_finished()) {
                return Ok(WorkerReport::running());
            }
            match job.task.take() {
                Some(task) => task,
                None => return Ok(WorkerReport::running()),
            }
        };

        let report = finished
            .await
            .unwrap_or_else(|e| RunReport::failed(format!("step runner panicked: {}", e)));
        let out = to_worker_report(&report);
        if let Some(job) = self.jobs.lock().get_mut(handle) {
            job.report = Some(report);
        }
        Ok(out)
    }

    async fn cancel(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let jobs = self.jobs.lock();
        let job = jobs.get(handle).ok_or_else(|| WorkerError::UnknownHandle(handle.to_string()))?;
        job.cancel.cancel();
        Ok(())
    }

    async fn cleanup(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let Some(job) = self.jobs.lock().remove(handle) else {
            return Ok(());
        };
        job.cancel.cancel();
        if let Some(task) = job.task {
            task.abort();
        }
        match std::fs::remove_dir_all(&job.dir) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                tracing::warn!(%handle, dir = %job.dir.display(), error = %e, "failed to remove job dir");
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
