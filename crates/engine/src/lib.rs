// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cv-engine: runs workflow tasks
//!
//! The [`Engine`] creates tasks from definitions, walks their stages in
//! order, holds approval gates, and hands each compiled job task to the
//! controller for its type. Every status change is persisted through the
//! task store and acknowledged through [`Ack`].

pub mod ack;
pub mod approval;
pub mod config;
pub mod controllers;
pub mod deps;
pub mod env;
pub mod error;
pub mod poll;
pub mod scheduler;
pub mod stage;
pub mod state;

pub use ack::{Ack, NotifyingAck};
pub use config::{ConfigError, EngineConfig};
pub use deps::ControllerDeps;
pub use error::EngineError;
pub use poll::{Observation, PollOutcome};
pub use scheduler::{Engine, EngineOptions};
pub use state::TaskState;

#[cfg(test)]
mod test_helpers;
