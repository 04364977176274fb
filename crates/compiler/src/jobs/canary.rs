// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canary deploy and its release.
//!
//! Both tasks of one canary share the same name suffix, derived from the
//! deploy job's identity, so the release finds what the deploy created.

use super::{cluster_scope, lint_rollout_targets, new_task};
use crate::error::CompileError;
use crate::naming;
use crate::scope::CompileScope;
use cv_core::spec::{CanaryDeployJobSpec, CanaryReleaseJobSpec};
use cv_core::task::CanaryTaskSpec;
use cv_core::{Infrastructure, Job, JobSpec, JobTask, JobTaskSpec};

fn spec_for(
    job: &str,
    spec: &CanaryDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<CanaryTaskSpec, CompileError> {
    Ok(CanaryTaskSpec {
        scope: cluster_scope(job, &spec.location, scope.ctx)?,
        percentage: spec.percentage,
        targets: spec.targets.clone(),
        name_suffix: naming::identity_hash(&scope.ctx.workflow_name, scope.ctx.task_id, job),
    })
}

fn origin<'a>(
    job: &Job,
    spec: &CanaryReleaseJobSpec,
    scope: &CompileScope<'a>,
) -> Result<(&'a Job, &'a CanaryDeployJobSpec), CompileError> {
    let origin = scope.origin(&job.name, &spec.from_job)?;
    match &origin.spec {
        JobSpec::K8sCanaryDeploy(deploy) => Ok((origin, deploy)),
        _ => Err(CompileError::UnsupportedOrigin {
            job: job.name.clone(),
            from: spec.from_job.clone(),
            job_type: origin.job_type(),
        }),
    }
}

pub fn to_deploy_jobs(
    job: &Job,
    spec: &CanaryDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::CanaryDeploy(spec_for(&job.name, spec, scope)?),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn to_release_jobs(
    job: &Job,
    spec: &CanaryReleaseJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let (origin, deploy) = origin(job, spec, scope)?;
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::CanaryRelease(spec_for(&origin.name, deploy, scope)?),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn lint_deploy(
    job: &Job,
    spec: &CanaryDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    if !(1..=100).contains(&spec.percentage) {
        return Err(CompileError::PercentageOutOfRange {
            job: job.name.clone(),
            percentage: spec.percentage,
        });
    }
    lint_rollout_targets(job, &spec.targets)?;
    cluster_scope(&job.name, &spec.location, scope.ctx)?;
    Ok(())
}

pub fn lint_release(
    job: &Job,
    spec: &CanaryReleaseJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    if spec.from_job.is_empty() {
        return Err(CompileError::missing(&job.name, "from_job"));
    }
    origin(job, spec, scope).map(|_| ())
}

#[cfg(test)]
#[path = "canary_tests.rs"]
mod tests;
