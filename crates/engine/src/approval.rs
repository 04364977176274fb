// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage approval gates.
//!
//! A manual gate holds its stage in `Waiting` until enough approvers agree,
//! anyone rejects, or the gate times out (which counts as a rejection).
//! Decisions arrive through [`decide`] while the gate is polled.

use crate::error::EngineError;
use crate::poll::{deadline_after, poll_until, Observation, PollOutcome};
use crate::state::TaskState;
use cv_core::{ApprovalDecision, ApprovalKind, ApprovalRecord, TaskStatus};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// User recorded for decisions made by auto-approve mode.
pub const AUTO_APPROVER: &str = "auto";

#[derive(Debug, Clone)]
pub struct GateSettings {
    pub poll_interval: Duration,
    /// Used when the gate itself sets no timeout
    pub default_timeout: Duration,
    pub auto_approve: bool,
}

fn verdict(record: &ApprovalRecord) -> Option<TaskStatus> {
    if record.is_rejected() {
        Some(TaskStatus::Rejected)
    } else if record.approvals() >= record.needed() {
        Some(TaskStatus::Passed)
    } else {
        None
    }
}

fn settle(task: &TaskState, idx: usize, status: TaskStatus, error: &str) {
    task.update_stage(idx, |stage, _| {
        if let Some(approval) = stage.approval.as_mut() {
            approval.status = status;
        }
        if !error.is_empty() {
            stage.error = error.to_string();
        }
    });
}

/// Hold stage `idx` at its gate. Returns Passed when the stage may run.
pub async fn wait_gate(
    task: &TaskState,
    idx: usize,
    settings: &GateSettings,
    cancel: &CancellationToken,
) -> TaskStatus {
    let Some(stage) = task.stage(idx) else {
        return TaskStatus::Failed;
    };
    let Some(record) = stage.approval else {
        return TaskStatus::Passed;
    };
    if record.status.is_terminal() {
        return record.status;
    }
    if matches!(record.kind, ApprovalKind::Automatic) {
        settle(task, idx, TaskStatus::Passed, "");
        return TaskStatus::Passed;
    }

    task.update_stage(idx, |stage, now| {
        stage.transition(TaskStatus::Waiting, now);
        if let Some(approval) = stage.approval.as_mut() {
            approval.status = TaskStatus::Waiting;
        }
    });
    tracing::info!(stage = %stage.name, needed = record.needed(), "waiting for approval");

    if settings.auto_approve {
        task.update_stage(idx, |stage, now| {
            if let Some(approval) = stage.approval.as_mut() {
                approval.decisions.push(ApprovalDecision {
                    user: AUTO_APPROVER.to_string(),
                    approved: true,
                    comment: "approved automatically".to_string(),
                    time: now,
                });
            }
        });
        settle(task, idx, TaskStatus::Passed, "");
        tracing::info!(stage = %stage.name, "approval granted automatically");
        return TaskStatus::Passed;
    }

    let timeout = if record.timeout_secs == 0 {
        settings.default_timeout
    } else {
        Duration::from_secs(record.timeout_secs)
    };
    let outcome = poll_until(settings.poll_interval, deadline_after(timeout), cancel, || async {
        match task.stage(idx).and_then(|s| s.approval) {
            Some(record) => verdict(&record).map_or(Observation::Pending, Observation::Ready),
            None => Observation::Failed("approval record disappeared".to_string()),
        }
    })
    .await;

    let (status, error) = match outcome {
        PollOutcome::Ready(status) => (status, String::new()),
        PollOutcome::Timeout => (TaskStatus::Rejected, "approval timed out".to_string()),
        PollOutcome::Cancelled => (TaskStatus::Cancelled, String::new()),
        PollOutcome::Failed(error) => (TaskStatus::Rejected, error),
    };
    settle(task, idx, status, &error);
    tracing::info!(stage = %stage.name, %status, "approval settled");
    status
}

/// Record `user`'s decision on the open gate of stage `stage_name`.
pub fn decide(
    task: &TaskState,
    stage_name: &str,
    user: &str,
    approved: bool,
    comment: &str,
) -> Result<(), EngineError> {
    task.update(|t, now| {
        let open = t
            .stage_mut(stage_name)
            .and_then(|s| s.approval.as_mut())
            .filter(|a| a.status == TaskStatus::Waiting);
        let Some(approval) = open else {
            return Err(EngineError::NoOpenApproval { stage: stage_name.to_string() });
        };
        if !approval.may_decide(user) {
            return Err(EngineError::NotApprover { user: user.to_string(), stage: stage_name.to_string() });
        }
        if approval.has_decided(user) {
            return Err(EngineError::AlreadyDecided { user: user.to_string(), stage: stage_name.to_string() });
        }
        approval.decisions.push(ApprovalDecision {
            user: user.to_string(),
            approved,
            comment: comment.to_string(),
            time: now,
        });
        tracing::info!(stage = %stage_name, %user, approved, "approval decision recorded");
        Ok(())
    })
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
