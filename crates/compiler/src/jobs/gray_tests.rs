// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{ctx, gray_job, scope};
use cv_core::test_support::{stage, workflow};
use cv_core::{TaskStatus, WorkflowTask};

fn chain() -> cv_core::WorkflowDefinition {
    workflow(
        "shop",
        vec![
            stage("g1", vec![gray_job("gray-1", "", 20)]),
            stage("g2", vec![gray_job("gray-2", "gray-1", 50)]),
            stage("g3", vec![gray_job("gray-3", "gray-2", 100)]),
        ],
    )
}

fn gray_spec(tasks: &[JobTask]) -> &GrayTaskSpec {
    match &tasks[0].spec {
        JobTaskSpec::GrayRelease(spec) => spec,
        other => panic!("expected gray release, got {}", other),
    }
}

#[test]
fn first_step_captures_nothing_yet() {
    let def = chain();
    let ctx = ctx();
    let job = &def.stages[0].jobs[0];
    let JobSpec::K8sGrayRelease(spec) = &job.spec else { unreachable!() };

    let tasks = to_release_jobs(job, spec, &scope(&def, &ctx)).unwrap();
    let gray = gray_spec(&tasks);
    assert!(gray.first_step);
    assert_eq!(gray.scope.namespace, "shop-staging");
    assert_eq!(gray.targets[0].workload_name, "web");
    assert_eq!(gray.targets[0].baseline_replicas, None);
}

#[test]
fn every_step_names_grays_after_the_chain_root() {
    let def = chain();
    let ctx = ctx();
    let scope = scope(&def, &ctx);
    let suffix = |idx: usize| {
        let job = &def.stages[idx].jobs[0];
        let JobSpec::K8sGrayRelease(spec) = &job.spec else { unreachable!() };
        gray_spec(&to_release_jobs(job, spec, &scope).unwrap()).name_suffix.clone()
    };

    let expected = naming::identity_hash(&ctx.workflow_name, ctx.task_id, "gray-1");
    assert_eq!(suffix(0), expected);
    assert_eq!(suffix(1), expected);
    assert_ne!(expected, naming::identity_hash(&ctx.workflow_name, ctx.task_id + 1, "gray-1"));
}

#[test]
fn chain_root_follows_links() {
    let def = chain();
    let ctx = ctx();
    let job = &def.stages[2].jobs[0];
    let JobSpec::K8sGrayRelease(spec) = &job.spec else { unreachable!() };
    let (root, _) = chain_root(job, spec, &scope(&def, &ctx)).unwrap();
    assert_eq!(root.name, "gray-1");
}

#[test]
fn later_step_inherits_the_captured_baseline() {
    let def = chain();
    let ctx = ctx();
    let root = &def.stages[0].jobs[0];
    let JobSpec::K8sGrayRelease(root_spec) = &root.spec else { unreachable!() };
    let mut root_tasks = to_release_jobs(root, root_spec, &scope(&def, &ctx)).unwrap();
    if let JobTaskSpec::GrayRelease(gray) = &mut root_tasks[0].spec {
        gray.targets[0].baseline_replicas = Some(4);
        gray.targets[0].origin_image = "web:1".into();
    }
    root_tasks[0].status = TaskStatus::Passed;

    let mut task = WorkflowTask { workflow_name: "shop".into(), task_id: 7, ..WorkflowTask::default() };
    task.stages.push(cv_core::StageTask { name: "g1".into(), jobs: root_tasks, ..Default::default() });

    let job = &def.stages[1].jobs[0];
    let JobSpec::K8sGrayRelease(spec) = &job.spec else { unreachable!() };
    let tasks = to_release_jobs(job, spec, &scope(&def, &ctx).with_task(&task)).unwrap();
    let gray = gray_spec(&tasks);
    assert!(!gray.first_step);
    assert_eq!(gray.gray_scale, 50);
    assert_eq!(gray.targets[0].baseline_replicas, Some(4));
    assert_eq!(gray.targets[0].origin_image, "web:1");
    assert_eq!(gray.targets[0].image, "web:2");
}

#[test]
fn later_step_fails_without_a_baseline() {
    let def = chain();
    let ctx = ctx();
    let task = WorkflowTask::default();
    let job = &def.stages[1].jobs[0];
    let JobSpec::K8sGrayRelease(spec) = &job.spec else { unreachable!() };
    assert_eq!(
        to_release_jobs(job, spec, &scope(&def, &ctx).with_task(&task)).unwrap_err(),
        CompileError::BaselineNotCaptured { job: "gray-2".into(), from: "gray-1".into() }
    );
}

#[yare::parameterized(
    zero      = { "", 0, false },
    first_ok  = { "", 99, true },
    first_max = { "", 100, false },
    later_max = { "gray-1", 100, true },
    later_over = { "gray-1", 101, false },
)]
fn gray_scale_ranges(from: &str, scale: u32, ok: bool) {
    let def = workflow(
        "shop",
        vec![stage("g1", vec![gray_job("gray-1", "", 10)]), stage("g2", vec![gray_job("canary", from, scale)])],
    );
    let ctx = ctx();
    let job = &def.stages[1].jobs[0];
    let JobSpec::K8sGrayRelease(spec) = &job.spec else { unreachable!() };
    let result = lint_release(job, spec, &scope(&def, &ctx));
    assert_eq!(result.is_ok(), ok, "{:?}", result);
}

#[test]
fn rollback_needs_workloads() {
    let def = workflow("shop", vec![]);
    let ctx = ctx();
    let job = Job::new("rollback", JobSpec::K8sGrayRollback(GrayRollbackJobSpec::default()));
    let JobSpec::K8sGrayRollback(spec) = &job.spec else { unreachable!() };
    assert_eq!(
        lint_rollback(&job, spec, &scope(&def, &ctx)).unwrap_err(),
        CompileError::missing("rollback", "workloads")
    );
}
