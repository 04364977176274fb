// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cv_core::{TaskStatus, WorkflowTask};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {workflow}#{task_id} already exists")]
    Duplicate { workflow: String, task_id: i64 },
    #[error("task {workflow}#{task_id} not found")]
    NotFound { workflow: String, task_id: i64 },
    #[error("task {workflow}#{task_id} is {status} and can no longer change")]
    Immutable { workflow: String, task_id: i64, status: TaskStatus },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
}

/// Minimal persistence contract for workflow tasks.
///
/// Every method is atomic with respect to the others. Records are never
/// deleted, and a record that reached a terminal status rejects further
/// changes.
pub trait TaskStore: Send + Sync + 'static {
    /// Persist a freshly created task. Fails if the id is already taken.
    fn create_task(&self, task: &WorkflowTask) -> Result<(), StoreError>;

    fn find_task(&self, workflow: &str, task_id: i64) -> Result<Option<WorkflowTask>, StoreError>;

    /// Replace the stored record with `task`.
    fn update_task(&self, task: &WorkflowTask) -> Result<(), StoreError>;

    /// Move a stored task to `status`. A terminal status settles every
    /// unfinished stage and job first. Returns false when the transition
    /// was not allowed.
    fn update_task_status(
        &self,
        workflow: &str,
        task_id: i64,
        status: TaskStatus,
        now: i64,
    ) -> Result<bool, StoreError>;

    /// Reserve the next task id of `workflow`. Ids start at 1 and are never
    /// handed out twice, even under concurrent callers.
    fn next_task_id(&self, workflow: &str) -> Result<i64, StoreError>;

    /// Tasks of `workflow`, newest first.
    fn list_tasks(&self, workflow: &str) -> Result<Vec<WorkflowTask>, StoreError>;
}
