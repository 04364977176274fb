// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot-backed task store.
//!
//! The full record set lives in memory; every mutation rewrites the
//! snapshot before the lock is released, so a successful call is durable
//! and concurrent callers observe a single order of writes.

use crate::snapshot::{load_snapshot, write_snapshot, FsSnapshotWriter, SnapshotWriter};
use crate::state::StoreState;
use crate::store::{StoreError, TaskStore};
use cv_core::{TaskStatus, WorkflowTask};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

pub struct FileTaskStore<W: SnapshotWriter = FsSnapshotWriter> {
    path: PathBuf,
    writer: W,
    state: Mutex<StoreState>,
}

impl FileTaskStore<FsSnapshotWriter> {
    /// Open (or start) the store at `path`, typically `<state dir>/tasks.zst`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::with_writer(FsSnapshotWriter, path)
    }
}

impl<W: SnapshotWriter> FileTaskStore<W> {
    pub fn with_writer(writer: W, path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = load_snapshot(&path)?.map(|s| s.state).unwrap_or_default();
        tracing::debug!(path = %path.display(), tasks = state.task_count(), "opened task store");
        Ok(Self { path, writer, state: Mutex::new(state) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `op` to a copy of the state and commit it only if the snapshot
    /// write succeeds.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        let mut next = state.clone();
        let out = op(&mut next)?;
        if next != *state {
            write_snapshot(&self.writer, &next, &self.path)?;
            *state = next;
        }
        Ok(out)
    }
}

impl<W: SnapshotWriter> TaskStore for FileTaskStore<W> {
    fn create_task(&self, task: &WorkflowTask) -> Result<(), StoreError> {
        self.mutate(|s| s.create_task(task))
    }

    fn find_task(&self, workflow: &str, task_id: i64) -> Result<Option<WorkflowTask>, StoreError> {
        Ok(self.state.lock().find_task(workflow, task_id).cloned())
    }

    fn update_task(&self, task: &WorkflowTask) -> Result<(), StoreError> {
        self.mutate(|s| s.update_task(task))
    }

    fn update_task_status(
        &self,
        workflow: &str,
        task_id: i64,
        status: TaskStatus,
        now: i64,
    ) -> Result<bool, StoreError> {
        self.mutate(|s| s.update_task_status(workflow, task_id, status, now))
    }

    fn next_task_id(&self, workflow: &str) -> Result<i64, StoreError> {
        self.mutate(|s| Ok(s.next_task_id(workflow)))
    }

    fn list_tasks(&self, workflow: &str) -> Result<Vec<WorkflowTask>, StoreError> {
        Ok(self.state.lock().list_tasks(workflow))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
