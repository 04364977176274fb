// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{ctx, rollout_target, scope};
use cv_core::spec::RolloutLocation;
use cv_core::test_support::{stage, workflow};

fn deploy(service: &str) -> Job {
    let mut target = rollout_target("web", "web:2");
    target.k8s_service_name = service.into();
    Job::new(
        "bg",
        JobSpec::K8sBlueGreenDeploy(BlueGreenDeployJobSpec {
            location: RolloutLocation { env: "staging".into(), ..RolloutLocation::default() },
            targets: vec![target],
            timeout_mins: 0,
        }),
    )
}

#[test]
fn release_reuses_the_deploy_version() {
    let release = Job::new(
        "bg-release",
        JobSpec::K8sBlueGreenRelease(BlueGreenReleaseJobSpec { from_job: "bg".into(), timeout_mins: 0 }),
    );
    let def = workflow("shop", vec![stage("d", vec![deploy("web-svc")]), stage("r", vec![release])]);
    let ctx = ctx();
    let scope = scope(&def, &ctx);

    let d_job = &def.stages[0].jobs[0];
    let JobSpec::K8sBlueGreenDeploy(d_spec) = &d_job.spec else { unreachable!() };
    let r_job = &def.stages[1].jobs[0];
    let JobSpec::K8sBlueGreenRelease(r_spec) = &r_job.spec else { unreachable!() };

    let d = to_deploy_jobs(d_job, d_spec, &scope).unwrap();
    let r = to_release_jobs(r_job, r_spec, &scope).unwrap();
    let (JobTaskSpec::BlueGreenDeploy(d), JobTaskSpec::BlueGreenRelease(r)) = (&d[0].spec, &r[0].spec) else {
        panic!("unexpected specs");
    };
    assert_eq!(d.version, r.version);
    assert!(d.version.starts_with("blue-"));
    assert_eq!(d.blue_name("web"), format!("web-{}", d.version));
}

#[test]
fn deploy_needs_a_service_name() {
    let def = workflow("shop", vec![stage("d", vec![deploy("")])]);
    let ctx = ctx();
    let job = &def.stages[0].jobs[0];
    let JobSpec::K8sBlueGreenDeploy(spec) = &job.spec else { unreachable!() };
    assert!(matches!(lint_deploy(job, spec, &scope(&def, &ctx)), Err(CompileError::MissingField { .. })));
}
