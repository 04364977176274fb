// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    passed = { TaskStatus::Passed, None },
    failed = { TaskStatus::Failed, Some(TASK_NOT_PASSED) },
    rejected = { TaskStatus::Rejected, Some(TASK_NOT_PASSED) },
    cancelled = { TaskStatus::Cancelled, Some(TASK_NOT_PASSED) },
    timeout = { TaskStatus::Timeout, Some(TASK_NOT_PASSED) },
)]
fn exit_code_follows_task_status(status: TaskStatus, code: Option<i32>) {
    assert_eq!(ExitError::for_status(status).map(|e| e.code), code);
}

#[test]
fn survives_anyhow_round_trip() {
    let err: anyhow::Error = ExitError::invalid("bad definition").into();
    let exit = err.downcast_ref::<ExitError>().unwrap();
    assert_eq!(exit.code, INVALID);
    assert_eq!(exit.to_string(), "bad definition");
}
