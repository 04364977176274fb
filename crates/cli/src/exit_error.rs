// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use cv_core::TaskStatus;
use std::fmt;

/// Any error without a more specific code
pub const FAILURE: i32 = 1;
/// The definition or its arguments do not compile
pub const INVALID: i32 = 2;
/// The task settled in a status other than passed
pub const TASK_NOT_PASSED: i32 = 3;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(INVALID, message)
    }

    /// Exit code for a settled task; `None` when it passed.
    pub fn for_status(status: TaskStatus) -> Option<Self> {
        if status.is_passed() {
            None
        } else {
            Some(Self::new(TASK_NOT_PASSED, String::new()))
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
