// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{ctx, gray_job, licensed_ctx};
use cv_core::spec::{
    JobSpec, MeegoJobSpec, PatchJobSpec, RolloutLocation, WorkerRuntime,
};
use cv_core::test_support::{build_job, shell_job, shell_job_with_outputs, stage, workflow};
use cv_core::{Infrastructure, Param};

#[test]
fn valid_workflow_passes() {
    let def = workflow(
        "shop",
        vec![
            stage("build", vec![build_job("build", &[("shop", "api")])]),
            stage("use", vec![shell_job("echo", "echo {{.job.build.shop.api.IMAGE}}")]),
        ],
    );
    assert_eq!(lint_workflow(&def, &ctx()), Ok(()));
}

#[test]
fn duplicate_names_are_rejected() {
    let def = workflow("shop", vec![stage("s", vec![]), stage("s", vec![])]);
    assert_eq!(lint_workflow(&def, &ctx()), Err(CompileError::DuplicateStage("s".into())));

    let def = workflow("shop", vec![stage("a", vec![shell_job("x", "true")]), stage("b", vec![shell_job("x", "true")])]);
    assert_eq!(lint_workflow(&def, &ctx()), Err(CompileError::DuplicateJob("x".into())));
}

#[test]
fn unknown_param_reference() {
    let mut def = workflow("shop", vec![stage("s", vec![shell_job("x", "echo {{.workflow.params.tag}}")])]);
    assert_eq!(lint_workflow(&def, &ctx()), Err(CompileError::UnknownParam("tag".into())));
    def.params.push(Param { name: "tag".into(), ..Param::default() });
    assert_eq!(lint_workflow(&def, &ctx()), Ok(()));
}

#[yare::parameterized(
    same_stage = { "x", "echo {{.job.a.OUT}}", true },
    undeclared = { "y", "echo {{.job.a.MISSING}}", false },
    unknown_job = { "z", "echo {{.job.ghost.OUT}}", false },
)]
fn output_reference_rules(name: &str, script: &str, same_stage: bool) {
    let producer = shell_job_with_outputs("a", "true", &["OUT"]);
    let consumer = shell_job(name, script);
    let def = if same_stage {
        workflow("shop", vec![stage("s", vec![producer, consumer])])
    } else {
        workflow("shop", vec![stage("s", vec![producer]), stage("t", vec![consumer])])
    };
    let err = lint_workflow(&def, &ctx()).unwrap_err();
    if same_stage {
        assert!(matches!(err, CompileError::OutputNotUpstream { .. }));
    } else {
        assert!(matches!(err, CompileError::UnknownOutputRef { .. }));
    }
}

#[test]
fn first_gray_step_must_stay_below_full_rollout() {
    let def = workflow("shop", vec![stage("g", vec![gray_job("gray", "", 100)])]);
    assert_eq!(
        lint_workflow(&def, &ctx()),
        Err(CompileError::GrayScaleOutOfRange { job: "gray".into(), scale: 100, range: "1-99" })
    );
}

#[test]
fn later_gray_step_may_reach_full_rollout() {
    let def = workflow(
        "shop",
        vec![stage("g1", vec![gray_job("gray-1", "", 20)]), stage("g2", vec![gray_job("gray-2", "gray-1", 100)])],
    );
    assert_eq!(lint_workflow(&def, &ctx()), Ok(()));
}

#[test]
fn later_gray_step_needs_root_in_an_earlier_stage() {
    let def = workflow("shop", vec![stage("g", vec![gray_job("gray-1", "", 20), gray_job("gray-2", "gray-1", 50)])]);
    assert_eq!(
        lint_workflow(&def, &ctx()),
        Err(CompileError::OriginNotUpstream { job: "gray-2".into(), from: "gray-1".into() })
    );
}

#[test]
fn empty_patch_is_rejected() {
    let patch = cv_core::Job::new(
        "patch",
        JobSpec::K8sPatch(PatchJobSpec {
            location: RolloutLocation { env: "staging".into(), ..RolloutLocation::default() },
            ..PatchJobSpec::default()
        }),
    );
    let def = workflow("shop", vec![stage("p", vec![patch])]);
    assert_eq!(lint_workflow(&def, &ctx()), Err(CompileError::EmptyPatchItems { job: "patch".into() }));
}

#[test]
fn licensed_features_are_gated() {
    let meego = cv_core::Job::new("meego", JobSpec::MeegoTransition(MeegoJobSpec::default()));
    let def = workflow("shop", vec![stage("s", vec![meego])]);
    assert!(matches!(lint_workflow(&def, &ctx()), Err(CompileError::LicenseRequired { .. })));
    assert_eq!(lint_workflow(&def, &licensed_ctx()), Ok(()));

    let mut vm = shell_job("vm", "true");
    if let JobSpec::Freestyle(spec) = &mut vm.spec {
        spec.runtime = WorkerRuntime { infrastructure: Infrastructure::Vm, ..WorkerRuntime::default() };
    }
    let def = workflow("shop", vec![stage("s", vec![vm])]);
    assert_eq!(
        lint_workflow(&def, &ctx()),
        Err(CompileError::LicenseRequired { job: "vm".into(), feature: "vm infrastructure".into() })
    );
}

#[test]
fn deploy_needs_a_known_environment() {
    let mut deploy = crate::test_helpers::deploy_from("deploy", "build");
    if let JobSpec::Deploy(spec) = &mut deploy.spec {
        spec.env = "prod".into();
    }
    let def = workflow(
        "shop",
        vec![stage("b", vec![build_job("build", &[("shop", "api")])]), stage("d", vec![deploy])],
    );
    assert_eq!(
        lint_workflow(&def, &ctx()),
        Err(CompileError::UnknownEnvironment { job: "deploy".into(), env: "prod".into() })
    );
}
