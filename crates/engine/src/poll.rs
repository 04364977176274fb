// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wait loop every controller and approval gate runs.
//!
//! [`next_step`] decides what to do with one observation; [`poll_until`]
//! drives an observer at a fixed interval. Cancellation is always checked
//! first, so a cancelled wait ends as Cancelled even when the observer would
//! have reported success or the deadline has passed.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One observation of the thing being waited on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    Ready(T),
    /// Not there yet, or a transient error worth retrying
    Pending,
    /// A definitive error: retrying cannot help
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Ready(T),
    Failed(String),
    Timeout,
    Cancelled,
}

/// What the loop does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Cancel,
    Finish,
    Fail,
    Timeout,
    Wait,
}

/// Longest wait a deadline may describe; larger timeouts are clamped to it.
pub const MAX_WAIT: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// The instant `timeout` from now, clamped to [`MAX_WAIT`].
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_WAIT)).unwrap_or(now)
}

/// Decide the next step from an observation. `settled` is whether the observer
/// returned Ready or Failed.
pub fn next_step(cancelled: bool, settled: Option<bool>, now: Instant, deadline: Instant) -> Step {
    if cancelled {
        return Step::Cancel;
    }
    match settled {
        Some(true) => Step::Finish,
        Some(false) => Step::Fail,
        None if now >= deadline => Step::Timeout,
        None => Step::Wait,
    }
}

/// Run `observe` every `interval` until it settles, `deadline` passes, or
/// `cancel` fires.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    deadline: Instant,
    cancel: &CancellationToken,
    mut observe: F,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Observation<T>>,
{
    loop {
        let observed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            observed = observe() => observed,
        };
        let settled = match &observed {
            Observation::Ready(_) => Some(true),
            Observation::Failed(_) => Some(false),
            Observation::Pending => None,
        };
        match next_step(cancel.is_cancelled(), settled, Instant::now(), deadline) {
            Step::Cancel => return PollOutcome::Cancelled,
            Step::Timeout => return PollOutcome::Timeout,
            Step::Finish | Step::Fail => {
                return match observed {
                    Observation::Ready(value) => PollOutcome::Ready(value),
                    Observation::Failed(error) => PollOutcome::Failed(error),
                    Observation::Pending => PollOutcome::Timeout,
                };
            }
            Step::Wait => {}
        }
        let wake = (Instant::now() + interval).min(deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep_until(wake) => {}
        }
    }
}

/// Run a single future to completion under the same cancel/deadline rules.
pub async fn run_until<T, Fut>(deadline: Instant, cancel: &CancellationToken, fut: Fut) -> PollOutcome<T>
where
    Fut: Future<Output = Result<T, String>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => PollOutcome::Cancelled,
        _ = tokio::time::sleep_until(deadline) => PollOutcome::Timeout,
        result = fut => match result {
            Ok(value) => PollOutcome::Ready(value),
            Err(error) => PollOutcome::Failed(error),
        },
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
