// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn shell_steps_are_wrapped_in_debug_points() {
    let steps = vec![
        Step::new("git", StepSpec::Git { repos: vec![] }),
        Step::shell("build", "make"),
    ];
    let names: Vec<String> = with_debug_points(&steps).into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["git", "debug-before", "build", "debug-after"]);
}

#[tokio::test]
async fn unarmed_point_does_not_block() {
    let dir = tempfile::tempdir().unwrap();
    let gate = DebugGate::new(dir.path());
    assert!(!gate.is_armed(DebugPosition::Before));
    assert!(gate.wait(DebugPosition::Before, &CancellationToken::new()).await);
}

#[tokio::test]
async fn armed_point_blocks_until_released() {
    let dir = tempfile::tempdir().unwrap();
    let gate = DebugGate::new(dir.path()).with_poll(Duration::from_millis(10));
    gate.arm(DebugPosition::After).unwrap();

    let waiter = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.wait(DebugPosition::After, &CancellationToken::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    gate.release(DebugPosition::After).unwrap();
    assert!(waiter.await.unwrap());
}

#[tokio::test]
async fn cancel_interrupts_armed_point() {
    let dir = tempfile::tempdir().unwrap();
    let gate = DebugGate::new(dir.path()).with_poll(Duration::from_millis(10));
    gate.arm(DebugPosition::Before).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(!gate.wait(DebugPosition::Before, &cancel).await);
}

#[test]
fn release_of_unarmed_point_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    DebugGate::new(dir.path()).release(DebugPosition::Before).unwrap();
}
