// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one stage of a workflow task.
//!
//! A stage is gated, then compiled against the live task (so it can see
//! what earlier stages captured), then its jobs run either one after the
//! other or all at once. A fail-fast job that does not pass stops the
//! stage: sequential stages skip the rest, parallel stages cancel the
//! siblings still running.

use crate::approval::{self, GateSettings};
use crate::controllers::run_job;
use crate::deps::ControllerDeps;
use crate::state::TaskState;
use cv_compiler::{compile_stage, CompileContext, CompileScope};
use cv_core::{ErrorPolicy, JobTask, TaskStatus};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the stages of one task share.
#[derive(Clone)]
pub struct StageRunner {
    pub deps: Arc<ControllerDeps>,
    pub task: Arc<TaskState>,
    pub ctx: CompileContext,
    pub gate: GateSettings,
    pub cancel: CancellationToken,
}

fn halts(status: TaskStatus, policy: ErrorPolicy) -> bool {
    policy == ErrorPolicy::FailFast && !status.is_passed()
}

impl StageRunner {
    /// Run stage `idx` to a terminal status.
    pub async fn run(&self, idx: usize) -> TaskStatus {
        let Some(stage) = self.task.stage(idx) else {
            return TaskStatus::Failed;
        };
        if stage.status.is_terminal() {
            return stage.status;
        }

        let gate = approval::wait_gate(&self.task, idx, &self.gate, &self.cancel).await;
        if gate != TaskStatus::Passed {
            self.task.update_stage(idx, |s, now| s.transition(gate, now));
            tracing::info!(stage = %stage.name, status = %gate, "stage stopped at approval gate");
            return gate;
        }
        if self.cancel.is_cancelled() {
            self.task.update_stage(idx, |s, now| s.transition(TaskStatus::Cancelled, now));
            return TaskStatus::Cancelled;
        }

        self.task.update_stage(idx, |s, now| s.transition(TaskStatus::Running, now));
        tracing::info!(stage = %stage.name, parallel = stage.parallel, "stage started");

        let keys = match self.compile(idx) {
            Ok(keys) => keys,
            Err(error) => {
                tracing::warn!(stage = %stage.name, %error, "stage failed to compile");
                self.task.update_stage(idx, |s, now| {
                    s.error = error;
                    s.transition(TaskStatus::Failed, now);
                });
                return TaskStatus::Failed;
            }
        };

        if stage.parallel {
            self.run_parallel(keys).await;
        } else {
            self.run_sequential(keys).await;
        }

        // Cancellation outranks whatever the jobs settled to
        let cancelled = self.cancel.is_cancelled();
        let status = self
            .task
            .update_stage(idx, |s, now| {
                for job in &mut s.jobs {
                    if !job.is_terminal() {
                        job.transition(TaskStatus::Cancelled, now);
                    }
                }
                let status = if cancelled { TaskStatus::Cancelled } else { s.aggregate() };
                s.transition(status, now);
                status
            })
            .unwrap_or(TaskStatus::Failed);
        tracing::info!(stage = %stage.name, %status, "stage finished");
        status
    }

    /// Compile the stage against the live task and install its job tasks.
    /// Jobs already settled by an earlier run keep their records.
    fn compile(&self, idx: usize) -> Result<Vec<(String, ErrorPolicy)>, String> {
        let snapshot = self.task.snapshot();
        let scope = CompileScope::new(&snapshot.origin_workflow_args, &self.ctx).with_task(&snapshot);
        let compiled = compile_stage(&scope, idx).map_err(|e| e.to_string())?;

        let jobs = self
            .task
            .update_stage(idx, |s, _| {
                let jobs: Vec<JobTask> = compiled
                    .into_iter()
                    .map(|job| match s.jobs.iter().find(|j| j.key == job.key && j.is_terminal()) {
                        Some(done) => done.clone(),
                        None => job,
                    })
                    .collect();
                s.jobs = jobs;
                s.jobs.iter().map(|j| (j.key.clone(), j.error_policy)).collect()
            })
            .unwrap_or_default();
        Ok(jobs)
    }

    async fn run_sequential(&self, keys: Vec<(String, ErrorPolicy)>) {
        for (key, policy) in keys {
            if self.cancel.is_cancelled() {
                break;
            }
            let status = run_job(self.deps.clone(), self.task.clone(), key.clone(), self.cancel.clone()).await;
            if halts(status, policy) {
                tracing::info!(job_key = %key, %status, "fail-fast job halted the stage");
                break;
            }
        }
    }

    async fn run_parallel(&self, keys: Vec<(String, ErrorPolicy)>) {
        let siblings = self.cancel.child_token();
        let runs = keys.into_iter().map(|(key, policy)| {
            let siblings = siblings.clone();
            let deps = self.deps.clone();
            let task = self.task.clone();
            async move {
                let status = run_job(deps, task, key.clone(), siblings.clone()).await;
                if halts(status, policy) && !siblings.is_cancelled() {
                    tracing::info!(job_key = %key, %status, "fail-fast job cancels its siblings");
                    siblings.cancel();
                }
            }
        });
        join_all(runs).await;
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
