// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::spec::{
    BuildJobSpec, BuildScript, FreestyleJobSpec, JobSpec, ServiceAndBuild, Step, WorkerRuntime,
};
use crate::types::{Infrastructure, Repo, ServiceModule};
use crate::workflow::{Job, Stage, WorkflowDefinition};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::status::TaskStatus;
    use proptest::prelude::*;

    pub fn arb_task_status() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Created),
            Just(TaskStatus::Waiting),
            Just(TaskStatus::Running),
            Just(TaskStatus::Passed),
            Just(TaskStatus::Failed),
            Just(TaskStatus::Cancelled),
            Just(TaskStatus::Timeout),
            Just(TaskStatus::Rejected),
            Just(TaskStatus::Skipped),
        ]
    }

    /// Service/module pairs drawn from a small alphabet so collisions happen.
    pub fn arb_service_modules() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[a-c]", "[x-z]"), 0..6)
    }
}

// ── Definition fixtures ─────────────────────────────────────────────────

pub fn local_runtime() -> WorkerRuntime {
    WorkerRuntime { infrastructure: Infrastructure::Local, ..WorkerRuntime::default() }
}

/// A normal freestyle job with one shell step.
pub fn shell_job(name: &str, script: &str) -> Job {
    Job::new(
        name,
        JobSpec::Freestyle(FreestyleJobSpec {
            runtime: local_runtime(),
            steps: vec![Step::shell("run", script)],
            ..FreestyleJobSpec::default()
        }),
    )
}

/// A freestyle job declaring outputs.
pub fn shell_job_with_outputs(name: &str, script: &str, outputs: &[&str]) -> Job {
    let mut job = shell_job(name, script);
    if let JobSpec::Freestyle(spec) = &mut job.spec {
        spec.outputs = outputs.iter().map(|o| o.to_string()).collect();
    }
    job
}

/// A build job over `(service, module)` pairs, each with one repo on `main`.
pub fn build_job(name: &str, modules: &[(&str, &str)]) -> Job {
    let service_and_builds = modules
        .iter()
        .map(|(service, module)| ServiceAndBuild {
            module: ServiceModule::new(*service, *module),
            build_name: format!("{}-build", module),
            image_name: module.to_string(),
            repos: vec![Repo { branch: "main".into(), ..Repo::new("acme", *module) }],
            build: BuildScript {
                runtime: local_runtime(),
                script: "make".into(),
                ..BuildScript::default()
            },
            ..ServiceAndBuild::default()
        })
        .collect();
    Job::new(name, JobSpec::Build(BuildJobSpec { service_and_builds, ..BuildJobSpec::default() }))
}

pub fn stage(name: &str, jobs: Vec<Job>) -> Stage {
    Stage { name: name.to_string(), jobs, ..Stage::default() }
}

pub fn parallel_stage(name: &str, jobs: Vec<Job>) -> Stage {
    Stage { parallel: true, ..stage(name, jobs) }
}

pub fn workflow(name: &str, stages: Vec<Stage>) -> WorkflowDefinition {
    WorkflowDefinition { name: name.to_string(), revision: 1, stages, ..WorkflowDefinition::default() }
}
