// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{ctx, scope};
use cv_core::test_support::{build_job, shell_job, stage, workflow};
use cv_core::{KeyVal, ServiceModule, TargetSource};

fn target(service: &str, module: &str) -> ServiceTarget {
    ServiceTarget { module: ServiceModule::new(service, module), ..ServiceTarget::default() }
}

#[test]
fn dedup_keeps_first_occurrence() {
    let mut second = target("shop", "api");
    second.image = "later".into();
    let targets = dedup_targets(vec![target("shop", "api"), target("shop", "web"), second]);
    assert_eq!(targets.len(), 2);
    assert!(targets[0].image.is_empty());
}

#[test]
fn overrides_attach_by_module() {
    let mut captured = target("shop", "web");
    captured.key_vals = vec![KeyVal::new("LEVEL", "3")];
    let targets =
        attach_overrides("lint", "build", vec![target("shop", "api"), target("shop", "web")], &[captured]).unwrap();
    assert!(targets[0].key_vals.is_empty());
    assert_eq!(targets[1].key_vals, vec![KeyVal::new("LEVEL", "3")]);
}

#[test]
fn stale_override_fails_closed() {
    let err = attach_overrides("lint", "build", vec![target("shop", "api")], &[target("shop", "gone")]).unwrap_err();
    assert_eq!(
        err,
        CompileError::TargetMissing { job: "lint".into(), from: "build".into(), target: "shop/gone".into() }
    );
}

#[test]
fn from_job_requires_a_name() {
    let def = workflow("shop", vec![]);
    let ctx = ctx();
    let err = service_targets(&scope(&def, &ctx), "lint", TargetSource::FromJob, "", &[]).unwrap_err();
    assert_eq!(err, CompileError::missing("lint", "from_job"));
}

#[test]
fn origin_targets_of_build_carry_images() {
    let def = workflow(
        "shop",
        vec![stage("b", vec![build_job("build", &[("shop", "api")])]), stage("c", vec![shell_job("after", "true")])],
    );
    let ctx = ctx();
    let targets = origin_targets(&scope(&def, &ctx), "after", "build").unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].image, "registry.example.com/acme/api:7-main");
    assert_eq!(targets[0].repos[0].name, "api");
}

#[test]
fn self_reference_is_rejected() {
    let def = workflow("shop", vec![stage("b", vec![build_job("build", &[("shop", "api")])])]);
    let ctx = ctx();
    assert_eq!(
        origin_targets(&scope(&def, &ctx), "build", "build").unwrap_err(),
        CompileError::OriginNotUpstream { job: "build".into(), from: "build".into() }
    );
}
