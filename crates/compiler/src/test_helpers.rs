// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by the compiler's unit tests.

use crate::context::{CompileContext, Feature};
use crate::scope::CompileScope;
use cv_core::spec::{
    DeployJobSpec, GrayReleaseJobSpec, RolloutLocation, RolloutTarget,
};
use cv_core::{Environment, Job, JobSpec, Registry, TargetSource, WorkflowDefinition};

pub const TASK_ID: i64 = 7;

pub fn registry() -> Registry {
    Registry {
        id: "hub".into(),
        address: "https://registry.example.com/".into(),
        namespace: "acme".into(),
        is_default: true,
        ..Registry::default()
    }
}

pub fn mirror() -> Registry {
    Registry {
        id: "mirror".into(),
        address: "mirror.example.com".into(),
        namespace: "prod".into(),
        ..Registry::default()
    }
}

pub fn ctx() -> CompileContext {
    CompileContext::new("shop")
        .task_id(TASK_ID)
        .registries(vec![registry(), mirror()])
        .environments(vec![Environment {
            name: "staging".into(),
            cluster_id: "c1".into(),
            namespace: "shop-staging".into(),
            production: false,
        }])
        .default_image("worker:1")
}

pub fn licensed_ctx() -> CompileContext {
    ctx().features(vec![Feature::VmInfrastructure, Feature::Meego, Feature::Apollo, Feature::Nacos])
}

pub fn scope<'a>(def: &'a WorkflowDefinition, ctx: &'a CompileContext) -> CompileScope<'a> {
    CompileScope::new(def, ctx)
}

pub fn deploy_from(name: &str, from: &str) -> Job {
    Job::new(
        name,
        JobSpec::Deploy(DeployJobSpec {
            env: "staging".into(),
            source: TargetSource::FromJob,
            from_job: from.into(),
            ..DeployJobSpec::default()
        }),
    )
}

pub fn rollout_target(workload: &str, image: &str) -> RolloutTarget {
    RolloutTarget {
        workload_name: workload.into(),
        container_name: "app".into(),
        image: image.into(),
        k8s_service_name: String::new(),
    }
}

pub fn gray_job(name: &str, from: &str, scale: u32) -> Job {
    Job::new(
        name,
        JobSpec::K8sGrayRelease(GrayReleaseJobSpec {
            from_job: from.into(),
            location: RolloutLocation { env: "staging".into(), ..RolloutLocation::default() },
            gray_scale: scale,
            targets: if from.is_empty() { vec![rollout_target("web", "web:2")] } else { Vec::new() },
            timeout_mins: 0,
        }),
    )
}
