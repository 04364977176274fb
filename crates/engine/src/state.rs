// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live record of a running workflow task.
//!
//! Controllers, the stage runner and approval calls all mutate the task
//! through [`TaskState`]. A mutation that changes anything is written to
//! the store and acknowledged before the lock is released, so the store and
//! the ack hook observe one order of changes.

use crate::ack::Ack;
use cv_core::{Clock, JobTask, StageTask, WorkflowTask};
use cv_storage::TaskStore;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct TaskState {
    task: Mutex<WorkflowTask>,
    store: Arc<dyn TaskStore>,
    ack: Arc<dyn Ack>,
    clock: Arc<dyn Clock>,
}

impl TaskState {
    pub fn new(
        task: WorkflowTask,
        store: Arc<dyn TaskStore>,
        ack: Arc<dyn Ack>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { task: Mutex::new(task), store, ack, clock }
    }

    pub fn snapshot(&self) -> WorkflowTask {
        self.task.lock().clone()
    }

    pub fn now(&self) -> i64 {
        self.clock.epoch_secs()
    }

    pub fn ack_hook(&self) -> &Arc<dyn Ack> {
        &self.ack
    }

    pub fn job(&self, key: &str) -> Option<JobTask> {
        self.task.lock().job(key).cloned()
    }

    pub fn stage(&self, idx: usize) -> Option<StageTask> {
        self.task.lock().stages.get(idx).cloned()
    }

    /// Apply `f`; persist and ack when the task changed.
    pub fn update<R>(&self, f: impl FnOnce(&mut WorkflowTask, i64) -> R) -> R {
        let now = self.now();
        let mut task = self.task.lock();
        let before = task.clone();
        let out = f(&mut task, now);
        if *task != before {
            self.commit(&task);
        }
        out
    }

    /// Apply `f` to the job task `key`. Returns None when there is no such job.
    pub fn update_job<R>(&self, key: &str, f: impl FnOnce(&mut JobTask, i64) -> R) -> Option<R> {
        self.update(|task, now| task.job_mut(key).map(|job| f(job, now)))
    }

    pub fn update_stage<R>(&self, idx: usize, f: impl FnOnce(&mut StageTask, i64) -> R) -> Option<R> {
        self.update(|task, now| task.stages.get_mut(idx).map(|stage| f(stage, now)))
    }

    fn commit(&self, task: &WorkflowTask) {
        if let Err(e) = self.store.update_task(task) {
            tracing::warn!(
                workflow = %task.workflow_name,
                task_id = task.task_id,
                error = %e,
                "failed to persist task"
            );
        }
        self.ack.ack(task);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
