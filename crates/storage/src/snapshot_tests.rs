// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::FakeSnapshotWriter;
use cv_core::WorkflowTask;
use std::sync::atomic::Ordering;
use tempfile::tempdir;

fn state_with_task() -> StoreState {
    let mut state = StoreState::default();
    let id = state.next_task_id("shop");
    state
        .create_task(&WorkflowTask { workflow_name: "shop".into(), task_id: id, ..WorkflowTask::default() })
        .unwrap();
    state
}

#[test]
fn write_is_durable_before_rename_is_visible() {
    let writer = FakeSnapshotWriter::default();
    write_snapshot(&writer, &state_with_task(), Path::new("/state/tasks.zst")).unwrap();
    assert_eq!(
        writer.ops(),
        vec!["write tasks.tmp", "fsync tasks.tmp", "rename tasks.tmp", "fsync_dir state"]
    );
}

#[test]
fn failed_rename_stops_before_dir_fsync() {
    let writer = FakeSnapshotWriter::default();
    writer.fail_rename.store(true, Ordering::SeqCst);
    let err = write_snapshot(&writer, &state_with_task(), Path::new("/state/tasks.zst")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert!(!writer.ops().iter().any(|op| op.starts_with("fsync_dir")));
}

#[test]
fn snapshot_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.zst");
    let state = state_with_task();

    let size = write_snapshot(&FsSnapshotWriter, &state, &path).unwrap();
    assert!(size > 0);
    assert!(!path.with_extension("tmp").exists());

    let loaded = load_snapshot(&path).unwrap().unwrap();
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state, state);
}

#[test]
fn missing_snapshot_loads_as_none() {
    let dir = tempdir().unwrap();
    assert!(load_snapshot(&dir.path().join("tasks.zst")).unwrap().is_none());
}

#[test]
fn corrupt_snapshot_is_moved_aside() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.zst");
    std::fs::write(&path, b"not zstd").unwrap();

    assert!(load_snapshot(&path).unwrap().is_none());
    assert!(!path.exists());
    assert!(path.with_extension("bak").exists());
}

#[test]
fn backups_rotate_and_keep_three() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.zst");
    for round in 0..4 {
        std::fs::write(&path, format!("garbage {round}")).unwrap();
        assert!(load_snapshot(&path).unwrap().is_none());
    }
    assert_eq!(std::fs::read_to_string(path.with_extension("bak")).unwrap(), "garbage 3");
    assert_eq!(std::fs::read_to_string(path.with_extension("bak.2")).unwrap(), "garbage 2");
    assert_eq!(std::fs::read_to_string(path.with_extension("bak.3")).unwrap(), "garbage 1");
    assert!(!path.with_extension("bak.4").exists());
}
