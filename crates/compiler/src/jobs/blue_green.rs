// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blue-green deploy and release.

use super::{cluster_scope, lint_rollout_targets, new_task};
use crate::error::CompileError;
use crate::naming;
use crate::scope::CompileScope;
use cv_core::spec::{BlueGreenDeployJobSpec, BlueGreenReleaseJobSpec};
use cv_core::task::BlueGreenTaskSpec;
use cv_core::{Infrastructure, Job, JobSpec, JobTask, JobTaskSpec};

fn spec_for(
    job: &str,
    spec: &BlueGreenDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<BlueGreenTaskSpec, CompileError> {
    Ok(BlueGreenTaskSpec {
        scope: cluster_scope(job, &spec.location, scope.ctx)?,
        targets: spec.targets.clone(),
        version: naming::blue_green_version(&scope.ctx.workflow_name, scope.ctx.task_id, job),
    })
}

fn origin<'a>(
    job: &Job,
    spec: &BlueGreenReleaseJobSpec,
    scope: &CompileScope<'a>,
) -> Result<(&'a Job, &'a BlueGreenDeployJobSpec), CompileError> {
    if spec.from_job.is_empty() {
        return Err(CompileError::missing(&job.name, "from_job"));
    }
    let origin = scope.origin(&job.name, &spec.from_job)?;
    match &origin.spec {
        JobSpec::K8sBlueGreenDeploy(deploy) => Ok((origin, deploy)),
        _ => Err(CompileError::UnsupportedOrigin {
            job: job.name.clone(),
            from: spec.from_job.clone(),
            job_type: origin.job_type(),
        }),
    }
}

pub fn to_deploy_jobs(
    job: &Job,
    spec: &BlueGreenDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::BlueGreenDeploy(spec_for(&job.name, spec, scope)?),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

/// The release carries the deploy's version so it can find the blue side.
pub fn to_release_jobs(
    job: &Job,
    spec: &BlueGreenReleaseJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let (origin, deploy) = origin(job, spec, scope)?;
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::BlueGreenRelease(spec_for(&origin.name, deploy, scope)?),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn lint_deploy(
    job: &Job,
    spec: &BlueGreenDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    lint_rollout_targets(job, &spec.targets)?;
    if let Some(t) = spec.targets.iter().find(|t| t.k8s_service_name.is_empty()) {
        return Err(CompileError::missing(
            &job.name,
            format!("k8s_service_name for {}", t.workload_name),
        ));
    }
    cluster_scope(&job.name, &spec.location, scope.ctx)?;
    Ok(())
}

pub fn lint_release(
    job: &Job,
    spec: &BlueGreenReleaseJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    origin(job, spec, scope).map(|_| ())
}

#[cfg(test)]
#[path = "blue_green_tests.rs"]
mod tests;
