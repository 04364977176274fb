// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::RecordingAck;
use cv_core::{FakeClock, TaskStatus};
use cv_storage::MemoryTaskStore;

fn setup() -> (TaskState, Arc<MemoryTaskStore>, Arc<RecordingAck>) {
    let store = Arc::new(MemoryTaskStore::new());
    let ack = Arc::new(RecordingAck::default());
    let task = WorkflowTask {
        workflow_name: "shop".to_string(),
        task_id: 1,
        stages: vec![StageTask {
            name: "build".to_string(),
            jobs: vec![JobTask::builder().key("compile").build()],
            ..StageTask::default()
        }],
        ..WorkflowTask::default()
    };
    store.create_task(&task).unwrap();
    let state = TaskState::new(task, store.clone(), ack.clone(), Arc::new(FakeClock::default()));
    (state, store, ack)
}

#[test]
fn changes_are_persisted_and_acked() {
    let (state, store, ack) = setup();
    let moved = state.update_job("compile", |job, now| job.transition(TaskStatus::Running, now));
    assert_eq!(moved, Some(true));

    let stored = store.find_task("shop", 1).unwrap().unwrap();
    assert_eq!(stored.job("compile").unwrap().status, TaskStatus::Running);
    assert_eq!(stored.job("compile").unwrap().start_time, 1_700_000_000);
    assert_eq!(ack.job_statuses("compile"), vec![TaskStatus::Running]);
}

#[test]
fn no_op_updates_are_not_acked() {
    let (state, _, ack) = setup();
    state.update_job("compile", |job, now| job.transition(TaskStatus::Created, now));
    state.update(|_, _| ());
    assert_eq!(ack.count(), 0);
}

#[test]
fn unknown_job_is_reported() {
    let (state, _, ack) = setup();
    assert_eq!(state.update_job("missing", |job, now| job.transition(TaskStatus::Running, now)), None);
    assert_eq!(ack.count(), 0);
}

#[test]
fn stage_updates_reach_the_store() {
    let (state, store, _) = setup();
    state.update_stage(0, |stage, now| stage.transition(TaskStatus::Waiting, now));
    let stored = store.find_task("shop", 1).unwrap().unwrap();
    assert_eq!(stored.stages[0].status, TaskStatus::Waiting);
    assert_eq!(state.stage(0).unwrap().status, TaskStatus::Waiting);
}
