// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::strategies::arb_task_status;
use proptest::prelude::*;

fn stage_with(jobs: Vec<JobTask>) -> StageTask {
    StageTask { name: "s".into(), status: TaskStatus::Running, jobs, ..StageTask::default() }
}

fn job(key: &str, status: TaskStatus, policy: ErrorPolicy) -> JobTask {
    JobTask::builder().key(key).name(key).status(status).error_policy(policy).build()
}

#[test]
fn transition_stamps_times() {
    let mut task = job("a", TaskStatus::Created, ErrorPolicy::FailFast);
    assert!(task.transition(TaskStatus::Running, 10));
    assert_eq!(task.start_time, 10);
    assert!(task.transition(TaskStatus::Passed, 25));
    assert_eq!(task.end_time, 25);
    assert!(!task.transition(TaskStatus::Failed, 30));
    assert_eq!(task.status, TaskStatus::Passed);
}

#[test]
fn fail_records_error_once() {
    let mut task = job("a", TaskStatus::Running, ErrorPolicy::FailFast);
    assert!(task.fail("boom", 5));
    assert!(!task.fail("second", 6));
    assert_eq!(task.error, "boom");
}

#[yare::parameterized(
    all_passed = { &[(TaskStatus::Passed, ErrorPolicy::FailFast), (TaskStatus::Passed, ErrorPolicy::FailFast)], TaskStatus::Passed },
    continue_failure_ignored = { &[(TaskStatus::Passed, ErrorPolicy::FailFast), (TaskStatus::Failed, ErrorPolicy::Continue)], TaskStatus::Passed },
    fail_fast_failure = { &[(TaskStatus::Failed, ErrorPolicy::FailFast), (TaskStatus::Cancelled, ErrorPolicy::FailFast)], TaskStatus::Failed },
    failure_beats_earlier_cancel = { &[(TaskStatus::Cancelled, ErrorPolicy::FailFast), (TaskStatus::Timeout, ErrorPolicy::FailFast)], TaskStatus::Timeout },
    only_cancelled = { &[(TaskStatus::Passed, ErrorPolicy::FailFast), (TaskStatus::Cancelled, ErrorPolicy::FailFast)], TaskStatus::Cancelled },
    still_running = { &[(TaskStatus::Running, ErrorPolicy::FailFast), (TaskStatus::Failed, ErrorPolicy::FailFast)], TaskStatus::Running },
)]
fn stage_aggregate(jobs: &[(TaskStatus, ErrorPolicy)], expected: TaskStatus) {
    let jobs = jobs
        .iter()
        .enumerate()
        .map(|(i, (status, policy))| job(&format!("j{}", i), *status, *policy))
        .collect();
    assert_eq!(stage_with(jobs).aggregate(), expected);
}

#[test]
fn finish_cancels_jobs_and_skips_unstarted_stages() {
    let mut task = WorkflowTask {
        workflow_name: "wf".into(),
        task_id: 1,
        status: TaskStatus::Running,
        stages: vec![
            stage_with(vec![
                job("a", TaskStatus::Failed, ErrorPolicy::FailFast),
                job("b", TaskStatus::Running, ErrorPolicy::FailFast),
            ]),
            StageTask {
                name: "later".into(),
                jobs: vec![job("c", TaskStatus::Created, ErrorPolicy::FailFast)],
                ..StageTask::default()
            },
        ],
        ..WorkflowTask::default()
    };
    task.finish(TaskStatus::Failed, 100);

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.end_time, 100);
    assert_eq!(task.job("b").map(|j| j.status), Some(TaskStatus::Cancelled));
    assert_eq!(task.job("c").map(|j| j.status), Some(TaskStatus::Cancelled));
    assert_eq!(task.stages[0].status, TaskStatus::Failed);
    assert_eq!(task.stages[1].status, TaskStatus::Skipped);
    assert!(task.jobs().all(|j| j.is_terminal()));
}

#[test]
fn ignored_failures_lists_continue_jobs() {
    let task = WorkflowTask {
        stages: vec![stage_with(vec![
            job("a", TaskStatus::Passed, ErrorPolicy::FailFast),
            job("b", TaskStatus::Failed, ErrorPolicy::Continue),
            job("c", TaskStatus::Passed, ErrorPolicy::Continue),
        ])],
        ..WorkflowTask::default()
    };
    let keys: Vec<&str> = task.ignored_failures().iter().map(|j| j.key.as_str()).collect();
    assert_eq!(keys, vec!["b"]);
}

#[test]
fn approval_needed_defaults_to_all_approvers() {
    let record = ApprovalRecord::new(
        ApprovalKind::Manual { approvers: vec!["a".into(), "b".into()], needed_approvers: 0 },
        60,
    );
    assert_eq!(record.needed(), 2);
    assert!(record.may_decide("a"));
    assert!(!record.may_decide("mallory"));
}

#[test]
fn job_task_round_trips_through_json() {
    let task = JobTask::builder()
        .key("build.svc.api")
        .spec(JobTaskSpec::GrayRelease(GrayTaskSpec {
            gray_scale: 20,
            first_step: true,
            targets: vec![GrayTarget {
                workload_name: "api".into(),
                container_name: "api".into(),
                image: "r/api:2".into(),
                ..GrayTarget::default()
            }],
            ..GrayTaskSpec::default()
        }))
        .build();
    let json = serde_json::to_string(&task).unwrap();
    let back: JobTask = serde_json::from_str(&json).unwrap();
    assert_eq!(back, task);
}

proptest! {
    #[test]
    fn finished_task_has_no_running_jobs(
        statuses in prop::collection::vec(arb_task_status(), 1..6),
        final_status in prop_oneof![
            Just(TaskStatus::Passed),
            Just(TaskStatus::Failed),
            Just(TaskStatus::Cancelled),
            Just(TaskStatus::Timeout),
        ],
    ) {
        let jobs = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| job(&format!("j{}", i), *s, ErrorPolicy::FailFast))
            .collect();
        let mut task = WorkflowTask { stages: vec![stage_with(jobs)], ..WorkflowTask::default() };
        task.finish(final_status, 1);
        prop_assert!(task.jobs().all(|j| j.is_terminal()));
        prop_assert!(task.stages.iter().all(|s| s.status.is_terminal()));
    }
}
