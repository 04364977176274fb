// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job controllers.
//!
//! [`run_job`] takes one compiled job task from Created to a terminal
//! status: it dispatches on the task spec, records the outcome and always
//! gives the controller a best-effort clean-up pass afterwards. Controllers
//! never panic the scheduler; every failure becomes a status.

mod blue_green;
mod canary;
mod deploy;
mod freestyle;
mod gray;
mod helm;
mod integration;
mod k8s;
mod patch;

pub use blue_green::{ORIGIN_VERSION, VERSION_LABEL};
pub use canary::CANARY_LABEL;
pub use gray::{GRAY_LABEL, ORIGIN_IMAGE_ANNOTATION, ORIGIN_REPLICAS_ANNOTATION};
pub use k8s::scaled_replicas;

use crate::deps::ControllerDeps;
use crate::poll::{self, Observation, PollOutcome};
use crate::state::TaskState;
use cv_adapters::Cluster;
use cv_core::{JobTask, JobTaskSpec, TaskStatus};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a controller run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Timeout,
    Cancelled,
}

impl Outcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            Outcome::Passed => TaskStatus::Passed,
            Outcome::Failed(_) => TaskStatus::Failed,
            Outcome::Timeout => TaskStatus::Timeout,
            Outcome::Cancelled => TaskStatus::Cancelled,
        }
    }

    /// Error text recorded on the job. Timeout and cancellation carry none.
    pub fn error(&self) -> &str {
        match self {
            Outcome::Failed(error) => error,
            _ => "",
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

impl<T> From<PollOutcome<T>> for Outcome {
    fn from(outcome: PollOutcome<T>) -> Self {
        match outcome {
            PollOutcome::Ready(_) => Outcome::Passed,
            PollOutcome::Failed(error) => Outcome::Failed(error),
            PollOutcome::Timeout => Outcome::Timeout,
            PollOutcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Controller steps short-circuit with the outcome that ended them.
pub(crate) type StepResult<T = ()> = Result<T, Outcome>;

pub(crate) fn fail(error: impl fmt::Display) -> Outcome {
    Outcome::Failed(error.to_string())
}

/// The ready value, or the outcome that ended the wait.
pub(crate) fn settled<T>(outcome: PollOutcome<T>) -> StepResult<T> {
    match outcome {
        PollOutcome::Ready(value) => Ok(value),
        other => Err(Outcome::from(other)),
    }
}

/// Everything one job run can reach.
pub struct JobRun {
    pub deps: Arc<ControllerDeps>,
    pub task: Arc<TaskState>,
    pub key: String,
    pub cancel: CancellationToken,
    pub deadline: Instant,
}

impl JobRun {
    /// Poll `observe` at the configured interval under this job's deadline.
    pub async fn poll<T, F, Fut>(&self, observe: F) -> PollOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Observation<T>>,
    {
        poll::poll_until(self.deps.poll_interval, self.deadline, &self.cancel, observe).await
    }

    /// Await one long call under this job's deadline.
    pub async fn call<T, Fut>(&self, fut: Fut) -> PollOutcome<T>
    where
        Fut: Future<Output = Result<T, String>>,
    {
        poll::run_until(self.deadline, &self.cancel, fut).await
    }

    /// Stop between steps once cancelled or out of time.
    pub fn checkpoint(&self) -> StepResult {
        if self.cancel.is_cancelled() {
            return Err(Outcome::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(Outcome::Timeout);
        }
        Ok(())
    }

    pub fn cluster(&self, id: &str) -> StepResult<Arc<dyn Cluster>> {
        self.deps.clusters.get(id).map_err(fail)
    }

    /// Mutate this job's record (persisted and acked).
    pub fn record<R>(&self, f: impl FnOnce(&mut JobTask) -> R) -> Option<R> {
        self.task.update_job(&self.key, |job, _| f(job))
    }

    pub fn workflow_name(&self) -> String {
        self.task.snapshot().workflow_name
    }
}

/// Run the job task `key` to a terminal status.
pub async fn run_job(
    deps: Arc<ControllerDeps>,
    task: Arc<TaskState>,
    key: String,
    cancel: CancellationToken,
) -> TaskStatus {
    let Some(job) = task.job(&key) else {
        tracing::error!(job_key = %key, "job task vanished before dispatch");
        return TaskStatus::Failed;
    };
    if job.is_terminal() {
        return job.status;
    }
    if cancel.is_cancelled() {
        task.update_job(&key, |j, now| j.transition(TaskStatus::Cancelled, now));
        return TaskStatus::Cancelled;
    }
    task.update_job(&key, |j, now| j.transition(TaskStatus::Running, now));
    tracing::info!(job_key = %key, job_type = %job.spec, timeout_secs = job.timeout_secs, "job started");

    let run = JobRun {
        deps,
        task: task.clone(),
        key: key.clone(),
        cancel,
        deadline: poll::deadline_after(Duration::from_secs(job.timeout_secs)),
    };
    let outcome = execute(&run, &job).await;
    clean(&run, &job, &outcome).await;

    let status = outcome.status();
    task.update_job(&key, |j, now| j.finish_with(status, outcome.error(), now));
    match &outcome {
        Outcome::Failed(error) => tracing::warn!(job_key = %key, %status, %error, "job finished"),
        _ => tracing::info!(job_key = %key, %status, "job finished"),
    }
    status
}

async fn execute(run: &JobRun, job: &JobTask) -> Outcome {
    let result = match &job.spec {
        JobTaskSpec::Freestyle(spec) => freestyle::run(run, job, spec).await,
        JobTaskSpec::Deploy(spec) => deploy::run(run, spec).await,
        JobTaskSpec::HelmDeploy(spec) => helm::run(run, spec).await,
        JobTaskSpec::CanaryDeploy(spec) => canary::deploy(run, spec).await,
        JobTaskSpec::CanaryRelease(spec) => canary::release(run, spec).await,
        JobTaskSpec::BlueGreenDeploy(spec) => blue_green::deploy(run, spec).await,
        JobTaskSpec::BlueGreenRelease(spec) => blue_green::release(run, spec).await,
        JobTaskSpec::GrayRelease(spec) => gray::release(run, spec).await,
        JobTaskSpec::GrayRollback(spec) => gray::rollback(run, spec).await,
        JobTaskSpec::K8sPatch(spec) => patch::run(run, spec).await,
        JobTaskSpec::IssueTransition(spec) => integration::transition(run, spec).await,
        JobTaskSpec::ConfigPublish(spec) => integration::publish(run, spec).await,
    };
    match result {
        Ok(()) => Outcome::Passed,
        Err(outcome) => outcome,
    }
}

/// Best-effort: errors are logged only.
async fn clean(run: &JobRun, job: &JobTask, outcome: &Outcome) {
    if outcome.is_passed() {
        return;
    }
    let result = match &job.spec {
        JobTaskSpec::CanaryDeploy(spec) => canary::clean(run, spec).await,
        JobTaskSpec::BlueGreenDeploy(spec) => blue_green::clean(run, spec).await,
        _ => Ok(()),
    };
    if let Err(error) = result {
        tracing::warn!(job_key = %job.key, %error, "clean-up failed");
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
