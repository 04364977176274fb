// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status acknowledgement hook.
//!
//! [`Ack::ack`] runs synchronously after every persisted mutation of a
//! workflow task (workflow, stage or job status, approval decisions,
//! captured rollout state). Implementations must return quickly; slow work
//! is spawned and awaited in [`Ack::flush`] once the task has settled.

use async_trait::async_trait;
use cv_adapters::{Notification, Notifier};
use cv_core::{TaskStatus, WorkflowTask};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[async_trait]
pub trait Ack: Send + Sync + 'static {
    fn ack(&self, task: &WorkflowTask);

    /// Wait for work spawned by earlier acks.
    async fn flush(&self) {}
}

/// Ignores every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAck;

impl Ack for NoAck {
    fn ack(&self, _task: &WorkflowTask) {}
}

#[async_trait]
impl Ack for Vec<Arc<dyn Ack>> {
    fn ack(&self, task: &WorkflowTask) {
        for hook in self {
            hook.ack(task);
        }
    }

    async fn flush(&self) {
        for hook in self {
            hook.flush().await;
        }
    }
}

/// The notification describing `task`'s current status.
pub fn notification(task: &WorkflowTask) -> Notification {
    let failures = task
        .jobs()
        .filter(|j| matches!(j.status, TaskStatus::Failed | TaskStatus::Timeout))
        .map(|j| {
            let error = if j.error.is_empty() { j.status.to_string() } else { j.error.clone() };
            (j.key.clone(), error)
        })
        .collect();
    Notification {
        workflow_name: task.workflow_name.clone(),
        task_id: task.task_id,
        status: task.status,
        creator: task.task_creator.clone(),
        failures,
    }
}

/// Sends a notification through each of the task's `notify_ctls` that
/// wants the workflow status it just moved to.
pub struct NotifyingAck {
    notifier: Arc<dyn Notifier>,
    /// Last workflow status seen per task
    seen: Mutex<HashMap<(String, i64), TaskStatus>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl NotifyingAck {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier, seen: Mutex::new(HashMap::new()), pending: Mutex::new(Vec::new()) }
    }

    fn status_changed(&self, task: &WorkflowTask) -> bool {
        let key = (task.workflow_name.clone(), task.task_id);
        let mut seen = self.seen.lock();
        if seen.get(&key) == Some(&task.status) {
            return false;
        }
        if task.status.is_terminal() {
            seen.remove(&key);
        } else {
            seen.insert(key, task.status);
        }
        true
    }
}

#[async_trait]
impl Ack for NotifyingAck {
    fn ack(&self, task: &WorkflowTask) {
        if !self.status_changed(task) {
            return;
        }
        let ctls: Vec<_> = task
            .origin_workflow_args
            .notify_ctls
            .iter()
            .filter(|ctl| ctl.wants(task.status))
            .cloned()
            .collect();
        if ctls.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(workflow = %task.workflow_name, task_id = task.task_id, "no runtime for notifications");
            return;
        };
        let notification = notification(task);
        let mut pending = self.pending.lock();
        for ctl in ctls {
            let notifier = self.notifier.clone();
            let notification = notification.clone();
            pending.push(runtime.spawn(async move {
                if let Err(e) = notifier.notify(&ctl, &notification).await {
                    tracing::warn!(
                        workflow = %notification.workflow_name,
                        task_id = notification.task_id,
                        webhook_type = %ctl.webhook_type,
                        error = %e,
                        "notification failed"
                    );
                }
            }));
        }
    }

    async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.pending.lock());
        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "ack_tests.rs"]
mod tests;
