// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Freestyle jobs: hand the steps to a worker and watch it.

use super::{fail, JobRun, Outcome, StepResult};
use crate::poll::{Observation, PollOutcome};
use cv_adapters::{OutputStore, Worker, WorkerError, WorkerHandle, WorkerReport, WorkerState};
use cv_compiler::jobs::freestyle::visit_step;
use cv_compiler::template::render_outputs;
use cv_compiler::OutputRef;
use cv_core::task::FreestyleTaskSpec;
use cv_core::{JobContext, JobTask, KeyVal, Registry, WorkflowTask};
use std::collections::BTreeMap;

pub const WORKFLOW_ENV: &str = "CONVEYOR_WORKFLOW";
pub const TASK_ID_ENV: &str = "CONVEYOR_TASK_ID";
pub const JOB_ENV: &str = "CONVEYOR_JOB";

fn render_in_place(text: &mut String, outputs: &dyn OutputStore, missing: &mut Option<OutputRef>) {
    if missing.is_some() || !text.contains("{{") {
        return;
    }
    match render_outputs(text, |r| outputs.get(&r.job_key, &r.output)) {
        Ok(rendered) => *text = rendered,
        Err(reference) => *missing = Some(reference),
    }
}

/// Build the worker payload, substituting upstream outputs that are only
/// known now.
pub(super) fn job_context(
    run: &JobRun,
    task: &WorkflowTask,
    job: &JobTask,
    spec: &FreestyleTaskSpec,
) -> StepResult<JobContext> {
    let outputs = run.deps.outputs.as_ref();
    let mut missing = None;

    let mut steps = spec.steps.clone();
    for step in &mut steps {
        visit_step(step, &mut |text: &mut String| render_in_place(text, outputs, &mut missing));
    }

    let mut envs = Vec::new();
    let mut secret_envs = Vec::new();
    for kv in &spec.envs {
        let mut kv = kv.clone();
        render_in_place(&mut kv.value, outputs, &mut missing);
        if kv.is_credential {
            secret_envs.push(kv);
        } else {
            envs.push(kv);
        }
    }
    if let Some(reference) = missing {
        return Err(fail(format!("output {} is not available", reference)));
    }

    let builtins = [
        (WORKFLOW_ENV, task.workflow_name.clone()),
        (TASK_ID_ENV, task.task_id.to_string()),
        (JOB_ENV, job.key.clone()),
    ];
    for (key, value) in builtins {
        if !envs.iter().chain(secret_envs.iter()).any(|kv| kv.key == key) {
            envs.push(KeyVal::new(key, value));
        }
    }

    let registries = spec
        .registries
        .iter()
        .map(|id| {
            run.deps
                .registry(id)
                .cloned()
                .ok_or_else(|| fail(format!("registry {} is not configured", id)))
        })
        .collect::<StepResult<Vec<Registry>>>()?;

    Ok(JobContext {
        workflow_name: task.workflow_name.clone(),
        task_id: task.task_id,
        job_key: job.key.clone(),
        workspace: format!("{}/{}/{}", task.workflow_name, task.task_id, job.name),
        envs,
        secret_envs,
        steps,
        outputs: job.outputs.clone(),
        registries,
    })
}

fn declared_outputs(job: &JobTask, reported: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    reported
        .iter()
        .filter(|(name, _)| job.outputs.iter().any(|o| o == *name))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

async fn watch(run: &JobRun, worker: &dyn Worker, handle: &WorkerHandle) -> PollOutcome<WorkerReport> {
    run.poll(|| async move {
        match worker.poll(handle).await {
            Ok(report) if report.state.is_terminal() => Observation::Ready(report),
            Ok(_) => Observation::Pending,
            Err(e @ WorkerError::UnknownHandle(_)) => Observation::Failed(e.to_string()),
            Err(e) => {
                tracing::warn!(%handle, error = %e, "worker poll failed, retrying");
                Observation::Pending
            }
        }
    })
    .await
}

fn finish(run: &JobRun, job: &JobTask, report: WorkerReport) -> StepResult {
    if !report.log.is_empty() {
        tracing::debug!(job_key = %job.key, log = %report.log, "worker log");
    }
    let outputs = declared_outputs(job, &report.outputs);
    if !outputs.is_empty() {
        run.deps.outputs.put(&job.key, &outputs);
    }
    match report.state {
        WorkerState::Succeeded | WorkerState::Running => Ok(()),
        WorkerState::Cancelled => Err(Outcome::Cancelled),
        WorkerState::Failed if report.error.is_empty() => Err(fail("steps failed")),
        WorkerState::Failed => Err(Outcome::Failed(report.error)),
    }
}

pub(super) async fn run(run: &JobRun, job: &JobTask, spec: &FreestyleTaskSpec) -> StepResult {
    let ctx = job_context(run, &run.task.snapshot(), job, spec)?;
    let worker = run.deps.workers.get(spec.runtime.infrastructure).map_err(fail)?;
    let handle = worker.start(&ctx, &spec.runtime).await.map_err(fail)?;
    tracing::info!(job_key = %job.key, %handle, steps = ctx.steps.len(), "job dispatched to worker");

    let result = match watch(run, worker.as_ref(), &handle).await {
        PollOutcome::Ready(report) => finish(run, job, report),
        PollOutcome::Failed(error) => Err(Outcome::Failed(error)),
        stopped @ (PollOutcome::Timeout | PollOutcome::Cancelled) => {
            if let Err(e) = worker.cancel(&handle).await {
                tracing::warn!(%handle, error = %e, "failed to cancel worker job");
            }
            Err(Outcome::from(stopped))
        }
    };
    if let Err(e) = worker.cleanup(&handle).await {
        tracing::warn!(%handle, error = %e, "worker clean-up failed");
    }
    result
}

#[cfg(test)]
#[path = "freestyle_tests.rs"]
mod tests;
