// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory record set shared by both store implementations.

use crate::store::StoreError;
use cv_core::{TaskStatus, WorkflowTask};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct WorkflowRecords {
    /// Last id handed out by `next_task_id`
    #[serde(default)]
    last_id: i64,
    #[serde(default)]
    tasks: Vec<WorkflowTask>,
}

/// Every task record, grouped by workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    workflows: BTreeMap<String, WorkflowRecords>,
}

impl StoreState {
    pub fn create_task(&mut self, task: &WorkflowTask) -> Result<(), StoreError> {
        let records = self.workflows.entry(task.workflow_name.clone()).or_default();
        if records.tasks.iter().any(|t| t.task_id == task.task_id) {
            return Err(StoreError::Duplicate {
                workflow: task.workflow_name.clone(),
                task_id: task.task_id,
            });
        }
        records.last_id = records.last_id.max(task.task_id);
        records.tasks.push(task.clone());
        Ok(())
    }

    pub fn find_task(&self, workflow: &str, task_id: i64) -> Option<&WorkflowTask> {
        self.workflows.get(workflow)?.tasks.iter().find(|t| t.task_id == task_id)
    }

    fn find_task_mut(&mut self, workflow: &str, task_id: i64) -> Result<&mut WorkflowTask, StoreError> {
        self.workflows
            .get_mut(workflow)
            .and_then(|r| r.tasks.iter_mut().find(|t| t.task_id == task_id))
            .ok_or_else(|| StoreError::NotFound { workflow: workflow.to_string(), task_id })
    }

    pub fn update_task(&mut self, task: &WorkflowTask) -> Result<(), StoreError> {
        let stored = self.find_task_mut(&task.workflow_name, task.task_id)?;
        if stored.status.is_terminal() && stored != task {
            return Err(StoreError::Immutable {
                workflow: task.workflow_name.clone(),
                task_id: task.task_id,
                status: stored.status,
            });
        }
        *stored = task.clone();
        Ok(())
    }

    pub fn update_task_status(
        &mut self,
        workflow: &str,
        task_id: i64,
        status: TaskStatus,
        now: i64,
    ) -> Result<bool, StoreError> {
        let stored = self.find_task_mut(workflow, task_id)?;
        if !stored.status.can_transition_to(status) || stored.status == status {
            return Ok(false);
        }
        if status.is_terminal() {
            stored.finish(status, now);
            Ok(true)
        } else {
            Ok(stored.transition(status, now))
        }
    }

    pub fn next_task_id(&mut self, workflow: &str) -> i64 {
        let records = self.workflows.entry(workflow.to_string()).or_default();
        let highest = records.tasks.iter().map(|t| t.task_id).max().unwrap_or(0);
        records.last_id = records.last_id.max(highest) + 1;
        records.last_id
    }

    pub fn list_tasks(&self, workflow: &str) -> Vec<WorkflowTask> {
        let mut tasks = self.workflows.get(workflow).map(|r| r.tasks.clone()).unwrap_or_default();
        tasks.sort_by(|a, b| b.task_id.cmp(&a.task_id));
        tasks
    }

    pub fn task_count(&self) -> usize {
        self.workflows.values().map(|r| r.tasks.len()).sum()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
