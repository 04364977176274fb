// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controllers::test_support::{Harness, POLL, WORKFLOW};
use cv_core::spec::{FreestyleJobSpec, FreestyleKind};
use cv_core::test_support::{local_runtime, parallel_stage, shell_job, stage, workflow};
use cv_core::{Approval, ApprovalKind, Job, JobSpec, Stage, TargetSource};
use std::time::Duration;

fn runner(harness: &Harness, task: Arc<TaskState>) -> StageRunner {
    StageRunner {
        deps: harness.deps.clone(),
        task,
        ctx: harness.compile_context(),
        gate: GateSettings { poll_interval: POLL, default_timeout: Duration::from_secs(60), auto_approve: false },
        cancel: CancellationToken::new(),
    }
}

fn lenient(job: Job) -> Job {
    Job { error_policy: ErrorPolicy::Continue, ..job }
}

fn statuses(task: &TaskState, idx: usize) -> Vec<(String, TaskStatus)> {
    task.stage(idx).unwrap().jobs.iter().map(|j| (j.key.clone(), j.status)).collect()
}

fn abc(parallel: bool) -> Stage {
    let jobs = vec![shell_job("a", "true"), shell_job("b", "true"), shell_job("c", "true")];
    if parallel {
        parallel_stage("build", jobs)
    } else {
        stage("build", jobs)
    }
}

#[tokio::test(start_paused = true)]
async fn sequential_stage_runs_jobs_in_order() {
    let harness = Harness::new();
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(false)]));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(harness.worker.started_keys(), vec!["a", "b", "c"]);
    let stage = task.stage(0).unwrap();
    assert_eq!(stage.status, TaskStatus::Passed);
    assert!(stage.start_time > 0 && stage.end_time >= stage.start_time);
}

#[tokio::test(start_paused = true)]
async fn fail_fast_failure_skips_the_rest_of_a_sequential_stage() {
    let harness = Harness::new();
    harness.worker.fail("b", "exit status 2");
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(false)]));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Failed);
    assert_eq!(harness.worker.started_keys(), vec!["a", "b"]);
    assert_eq!(
        statuses(&task, 0),
        vec![
            ("a".to_string(), TaskStatus::Passed),
            ("b".to_string(), TaskStatus::Failed),
            ("c".to_string(), TaskStatus::Cancelled),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn continue_policy_failure_does_not_stop_the_stage() {
    let harness = Harness::new();
    harness.worker.fail("b", "flaky");
    let jobs = vec![shell_job("a", "true"), lenient(shell_job("b", "true")), shell_job("c", "true")];
    let task = harness.compiled(workflow(WORKFLOW, vec![stage("build", jobs)]));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(harness.worker.started_keys(), vec!["a", "b", "c"]);
    let snapshot = task.snapshot();
    let ignored: Vec<_> = snapshot.ignored_failures().iter().map(|j| j.key.clone()).collect();
    assert_eq!(ignored, vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn parallel_stage_runs_jobs_concurrently() {
    let harness = Harness::new();
    for key in ["a", "b", "c"] {
        harness.worker.set_running_polls(key, 5);
    }
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(true)]));
    let started = tokio::time::Instant::now();

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(harness.worker.started_keys().len(), 3);
    assert!(started.elapsed() < POLL * 10);
}

#[tokio::test(start_paused = true)]
async fn parallel_fail_fast_cancels_running_siblings() {
    let harness = Harness::new();
    harness.worker.hang("a");
    harness.worker.set_running_polls("b", 2);
    harness.worker.fail("b", "boom");
    harness.worker.hang("c");
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(true)]));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Failed);
    assert_eq!(
        statuses(&task, 0),
        vec![
            ("a".to_string(), TaskStatus::Cancelled),
            ("b".to_string(), TaskStatus::Failed),
            ("c".to_string(), TaskStatus::Cancelled),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn parallel_continue_failure_leaves_siblings_running() {
    let harness = Harness::new();
    harness.worker.fail("a", "flaky");
    harness.worker.set_running_polls("b", 3);
    let jobs = vec![lenient(shell_job("a", "true")), shell_job("b", "true")];
    let task = harness.compiled(workflow(WORKFLOW, vec![parallel_stage("build", jobs)]));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(task.job("b").unwrap().status, TaskStatus::Passed);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_a_sequential_stage() {
    let harness = Harness::new();
    harness.worker.hang("a");
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(false)]));
    let runner = runner(&harness, task.clone());
    let cancel = runner.cancel.clone();

    let handle = tokio::spawn(async move { runner.run(0).await });
    tokio::time::sleep(POLL * 3).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), TaskStatus::Cancelled);
    assert_eq!(harness.worker.started_keys(), vec!["a"]);
    assert!(statuses(&task, 0).iter().all(|(_, s)| *s == TaskStatus::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn rejected_gate_runs_no_jobs() {
    let harness = Harness::new();
    let gated = Stage {
        approval: Some(Approval {
            kind: ApprovalKind::Manual { approvers: vec!["alice".into()], needed_approvers: 1 },
            timeout_mins: 1,
            description: String::new(),
        }),
        ..abc(false)
    };
    let task = harness.compiled(workflow(WORKFLOW, vec![gated]));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Rejected);
    assert!(harness.worker.started_keys().is_empty());
    let stage = task.stage(0).unwrap();
    assert_eq!(stage.status, TaskStatus::Rejected);
    assert_eq!(stage.error, "approval timed out");
}

#[tokio::test(start_paused = true)]
async fn approved_gate_runs_the_stage() {
    let harness = Harness::new();
    let gated = Stage {
        approval: Some(Approval {
            kind: ApprovalKind::Manual { approvers: vec!["alice".into()], needed_approvers: 1 },
            timeout_mins: 0,
            description: String::new(),
        }),
        ..abc(false)
    };
    let task = harness.compiled(workflow(WORKFLOW, vec![gated]));
    let runner = runner(&harness, task.clone());
    let handle = tokio::spawn(async move { runner.run(0).await });

    tokio::time::sleep(POLL).await;
    approval::decide(&task, "build", "alice", true, "").unwrap();

    assert_eq!(handle.await.unwrap(), TaskStatus::Passed);
    assert_eq!(
        harness.ack.stage_statuses("build"),
        vec![TaskStatus::Waiting, TaskStatus::Running, TaskStatus::Passed]
    );
}

#[tokio::test(start_paused = true)]
async fn compile_failure_fails_the_stage() {
    let harness = Harness::new();
    let orphan = Job::new(
        "per-service",
        JobSpec::Freestyle(FreestyleJobSpec {
            kind: FreestyleKind::Service,
            runtime: local_runtime(),
            source: TargetSource::FromJob,
            from_job: "ghost".into(),
            ..FreestyleJobSpec::default()
        }),
    );
    let mut def = workflow(WORKFLOW, vec![stage("build", vec![shell_job("a", "true")])]);
    let task = harness.compiled(def.clone());
    def.stages[0].jobs.push(orphan);
    task.update(|t, _| t.origin_workflow_args = def);

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Failed);
    assert!(task.stage(0).unwrap().error.contains("ghost"));
    assert!(harness.worker.started_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn settled_jobs_are_not_rerun() {
    let harness = Harness::new();
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(false)]));
    task.update_job("a", |j, now| j.transition(TaskStatus::Passed, now));

    let status = runner(&harness, task.clone()).run(0).await;

    assert_eq!(status, TaskStatus::Passed);
    assert_eq!(harness.worker.started_keys(), vec!["b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn terminal_stage_is_returned_as_is() {
    let harness = Harness::new();
    let task = harness.compiled(workflow(WORKFLOW, vec![abc(false)]));
    task.update_stage(0, |s, now| s.transition(TaskStatus::Skipped, now));

    assert_eq!(runner(&harness, task).run(0).await, TaskStatus::Skipped);
    assert!(harness.worker.started_keys().is_empty());
}
