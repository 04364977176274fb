// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::ack::Ack;
use cv_core::{TaskStatus, WorkflowTask};
use parking_lot::Mutex;

/// Keeps every acknowledged snapshot.
#[derive(Default)]
pub struct RecordingAck {
    snapshots: Mutex<Vec<WorkflowTask>>,
}

fn changes(statuses: impl Iterator<Item = TaskStatus>) -> Vec<TaskStatus> {
    let mut out: Vec<TaskStatus> = Vec::new();
    for status in statuses {
        if out.last() != Some(&status) {
            out.push(status);
        }
    }
    out
}

impl RecordingAck {
    pub fn count(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn last(&self) -> Option<WorkflowTask> {
        self.snapshots.lock().last().cloned()
    }

    /// Successive statuses of one job as acknowledged.
    pub fn job_statuses(&self, key: &str) -> Vec<TaskStatus> {
        let snapshots = self.snapshots.lock();
        changes(snapshots.iter().filter_map(|t| t.job(key).map(|j| j.status)))
    }

    pub fn stage_statuses(&self, name: &str) -> Vec<TaskStatus> {
        let snapshots = self.snapshots.lock();
        changes(snapshots.iter().filter_map(|t| t.stage(name).map(|s| s.status)))
    }

    pub fn workflow_statuses(&self) -> Vec<TaskStatus> {
        let snapshots = self.snapshots.lock();
        changes(snapshots.iter().map(|t| t.status))
    }
}

impl Ack for RecordingAck {
    fn ack(&self, task: &WorkflowTask) {
        self.snapshots.lock().push(task.clone());
    }
}
