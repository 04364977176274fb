// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controllers::test_support::{job, Harness, POLL};
use cv_adapters::WorkerCall;
use cv_core::task::FreestyleTaskSpec;
use cv_core::spec::Step;
use cv_core::test_support::local_runtime;

fn shell(key: &str) -> JobTask {
    job(
        key,
        JobTaskSpec::Freestyle(FreestyleTaskSpec {
            runtime: local_runtime(),
            steps: vec![Step::shell("main", "make")],
            ..FreestyleTaskSpec::default()
        }),
    )
}

#[yare::parameterized(
    passed = { Outcome::Passed, TaskStatus::Passed, "" },
    failed = { Outcome::Failed("boom".to_string()), TaskStatus::Failed, "boom" },
    timeout = { Outcome::Timeout, TaskStatus::Timeout, "" },
    cancelled = { Outcome::Cancelled, TaskStatus::Cancelled, "" },
)]
fn outcome_maps_to_status(outcome: Outcome, status: TaskStatus, error: &str) {
    assert_eq!(outcome.status(), status);
    assert_eq!(outcome.error(), error);
}

#[tokio::test(start_paused = true)]
async fn job_moves_through_running_to_passed() {
    let h = Harness::new();
    let state = h.state(vec![shell("build")]);

    let status = run_job(h.deps.clone(), state.clone(), "build".to_string(), CancellationToken::new()).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(h.ack.job_statuses("build"), vec![TaskStatus::Running, TaskStatus::Passed]);
    let job = state.job("build").unwrap();
    assert_eq!(job.start_time, 1_700_000_000);
    assert_eq!(job.end_time, 1_700_000_000);
}

#[tokio::test(start_paused = true)]
async fn missing_job_fails() {
    let h = Harness::new();
    let state = h.state(vec![]);
    let status = run_job(h.deps.clone(), state, "ghost".to_string(), CancellationToken::new()).await;
    assert_eq!(status, TaskStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_dispatch_never_starts() {
    let h = Harness::new();
    let state = h.state(vec![shell("build")]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let status = run_job(h.deps.clone(), state.clone(), "build".to_string(), cancel).await;

    assert_eq!(status, TaskStatus::Cancelled);
    assert!(h.worker.started().is_empty());
    assert_eq!(state.job("build").unwrap().status, TaskStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_a_long_step_settles_within_one_poll() {
    let h = Harness::new();
    h.worker.hang("build");
    let state = h.state(vec![shell("build")]);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(run_job(h.deps.clone(), state.clone(), "build".to_string(), cancel.clone()));
    tokio::time::sleep(Duration::from_secs(10)).await;
    let cancelled_at = Instant::now();
    cancel.cancel();
    let status = handle.await.unwrap();

    assert_eq!(status, TaskStatus::Cancelled);
    assert!(Instant::now() - cancelled_at <= POLL);
    assert!(h.worker.calls().contains(&WorkerCall::Cancel { handle: "build#1".to_string() }));
    assert_eq!(state.job("build").unwrap().error, "");
}

#[tokio::test(start_paused = true)]
async fn huge_timeout_runs_instead_of_overflowing() {
    let h = Harness::new();
    let mut build = shell("build");
    build.timeout_secs = (u64::MAX / 60) * 60;
    let state = h.state(vec![build]);

    let status = run_job(h.deps.clone(), state.clone(), "build".to_string(), CancellationToken::new()).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(state.job("build").unwrap().status, TaskStatus::Passed);
}

#[tokio::test(start_paused = true)]
async fn finished_job_is_not_run_again() {
    let h = Harness::new();
    let mut done = shell("build");
    done.status = TaskStatus::Passed;
    let state = h.state(vec![done]);

    let status = run_job(h.deps.clone(), state.clone(), "build".to_string(), CancellationToken::new()).await;
    assert_eq!(status, TaskStatus::Passed);
    assert!(h.worker.started().is_empty());
}
