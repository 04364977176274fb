// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle statuses shared by workflow, stage and job tasks.

use serde::{Deserialize, Serialize};

/// Status of a workflow, stage, or job task.
///
/// `Created → Running → {Passed | Failed | Cancelled | Timeout | Rejected}`.
/// Stages additionally pass through `Waiting` while an approval gate is open,
/// and stages that never started end as `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Created,
    /// Blocked on an approval gate
    Waiting,
    Running,
    Passed,
    Failed,
    Cancelled,
    Timeout,
    /// Approval denied or timed out
    Rejected,
    /// Never started because an earlier stage halted the workflow
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Passed
                | TaskStatus::Failed
                | TaskStatus::Cancelled
                | TaskStatus::Timeout
                | TaskStatus::Rejected
                | TaskStatus::Skipped
        )
    }

    pub fn is_passed(self) -> bool {
        self == TaskStatus::Passed
    }

    /// Whether moving from `self` to `next` respects monotonicity.
    ///
    /// Terminal statuses never change. `Running` cannot fall back to
    /// `Created` or `Waiting`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        if self == next {
            return true;
        }
        match self {
            s if s.is_terminal() => false,
            TaskStatus::Created => true,
            TaskStatus::Waiting => next != TaskStatus::Created,
            TaskStatus::Running => !matches!(next, TaskStatus::Created | TaskStatus::Waiting),
            _ => false,
        }
    }
}

crate::simple_display! {
    TaskStatus {
        Created => "created",
        Waiting => "waiting",
        Running => "running",
        Passed => "passed",
        Failed => "failed",
        Cancelled => "cancelled",
        Timeout => "timeout",
        Rejected => "rejected",
        Skipped => "skipped",
    }
}

/// Whether a job failure halts its enclosing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    #[default]
    FailFast,
    Continue,
}

crate::simple_display! {
    ErrorPolicy {
        FailFast => "fail_fast",
        Continue => "continue",
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
