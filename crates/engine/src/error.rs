// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::ConfigError;
use cv_compiler::CompileError;
use cv_core::TaskStatus;
use cv_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("task {workflow}#{task_id} not found")]
    TaskNotFound { workflow: String, task_id: i64 },
    #[error("task {workflow}#{task_id} is already running")]
    AlreadyRunning { workflow: String, task_id: i64 },
    #[error("task {workflow}#{task_id} already finished as {status}")]
    Finished { workflow: String, task_id: i64, status: TaskStatus },
    #[error("task driver stopped: {0}")]
    Join(String),
    #[error("task {workflow}#{task_id} is not running")]
    NotRunning { workflow: String, task_id: i64 },
    #[error("stage {stage} has no open approval")]
    NoOpenApproval { stage: String },
    #[error("{user} is not an approver of stage {stage}")]
    NotApprover { user: String, stage: String },
    #[error("{user} already decided on stage {stage}")]
    AlreadyDecided { user: String, stage: String },
}
