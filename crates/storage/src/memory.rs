// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::state::StoreState;
use crate::store::{StoreError, TaskStore};
use cv_core::{TaskStatus, WorkflowTask};
use parking_lot::Mutex;

/// Volatile store. Used by tests and by one-shot `cv run` without a state dir.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    state: Mutex<StoreState>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn create_task(&self, task: &WorkflowTask) -> Result<(), StoreError> {
        self.state.lock().create_task(task)
    }

    fn find_task(&self, workflow: &str, task_id: i64) -> Result<Option<WorkflowTask>, StoreError> {
        Ok(self.state.lock().find_task(workflow, task_id).cloned())
    }

    fn update_task(&self, task: &WorkflowTask) -> Result<(), StoreError> {
        self.state.lock().update_task(task)
    }

    fn update_task_status(
        &self,
        workflow: &str,
        task_id: i64,
        status: TaskStatus,
        now: i64,
    ) -> Result<bool, StoreError> {
        self.state.lock().update_task_status(workflow, task_id, status, now)
    }

    fn next_task_id(&self, workflow: &str) -> Result<i64, StoreError> {
        Ok(self.state.lock().next_task_id(workflow))
    }

    fn list_tasks(&self, workflow: &str) -> Result<Vec<WorkflowTask>, StoreError> {
        Ok(self.state.lock().list_tasks(workflow))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
