// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cv-core: data model for the Conveyor workflow engine

pub mod macros;

pub mod clock;
pub mod context;
pub mod spec;
pub mod status;
pub mod task;
pub mod types;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use context::{JobContext, OUTPUTS_DIR_ENV};
pub use spec::{JobSpec, JobType, TargetSource};
pub use status::{ErrorPolicy, TaskStatus};
#[cfg(any(test, feature = "test-support"))]
pub use task::JobTaskBuilder;
pub use task::{ApprovalDecision, ApprovalRecord, JobTask, JobTaskSpec, StageTask, WorkflowTask};
pub use types::{
    Environment, GroupVersionKind, Infrastructure, KeyVal, PatchStrategy, Registry, Repo,
    RepoIdentity, RepoSource, ServiceModule, ServiceTarget,
};
pub use workflow::{
    Approval, ApprovalKind, Job, NotifyCtl, Param, ParamType, Stage, WorkflowArgs,
    WorkflowDefinition,
};
