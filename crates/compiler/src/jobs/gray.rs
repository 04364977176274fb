// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gray release chains and gray rollback.
//!
//! The first step of a chain has no `from_job`; later steps name an
//! earlier step and scale against the baseline the chain root captured.

use super::{cluster_scope, lint_rollout_targets, new_task};
use crate::error::CompileError;
use crate::naming;
use crate::scope::CompileScope;
use cv_core::spec::{GrayReleaseJobSpec, GrayRollbackJobSpec};
use cv_core::task::{GrayRollbackTaskSpec, GrayTarget, GrayTaskSpec};
use cv_core::{Infrastructure, Job, JobSpec, JobTask, JobTaskSpec};

/// Follow `from_job` links back to the step that started the chain.
pub fn chain_root<'a>(
    job: &'a Job,
    spec: &'a GrayReleaseJobSpec,
    scope: &CompileScope<'a>,
) -> Result<(&'a Job, &'a GrayReleaseJobSpec), CompileError> {
    let (mut current, mut current_spec) = (job, spec);
    while !current_spec.from_job.is_empty() {
        let origin = scope.origin(&current.name, &current_spec.from_job)?;
        let JobSpec::K8sGrayRelease(origin_spec) = &origin.spec else {
            return Err(CompileError::UnsupportedOrigin {
                job: current.name.clone(),
                from: current_spec.from_job.clone(),
                job_type: origin.job_type(),
            });
        };
        current = origin;
        current_spec = origin_spec;
    }
    Ok((current, current_spec))
}

/// Baseline recorded on the root's job task, by workload name.
fn captured_targets(
    job: &Job,
    root: &Job,
    scope: &CompileScope<'_>,
) -> Result<Option<Vec<GrayTarget>>, CompileError> {
    let Some(task) = scope.task else {
        return Ok(None);
    };
    let captured = task.jobs_of(&root.name).find_map(|t| match &t.spec {
        JobTaskSpec::GrayRelease(gray) => Some(gray.targets.clone()),
        _ => None,
    });
    match captured {
        Some(targets) if targets.iter().all(|t| t.baseline_replicas.is_some()) => Ok(Some(targets)),
        _ => Err(CompileError::BaselineNotCaptured { job: job.name.clone(), from: root.name.clone() }),
    }
}

pub fn to_release_jobs(
    job: &Job,
    spec: &GrayReleaseJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let (root, root_spec) = chain_root(job, spec, scope)?;
    let first_step = std::ptr::eq(root, job);
    let cluster = cluster_scope(&root.name, &root_spec.location, scope.ctx)?;

    let mut targets: Vec<GrayTarget> = root_spec
        .targets
        .iter()
        .map(|t| GrayTarget {
            workload_name: t.workload_name.clone(),
            container_name: t.container_name.clone(),
            image: t.image.clone(),
            baseline_replicas: None,
            origin_image: String::new(),
        })
        .collect();

    if !first_step {
        // A later step may move to a newer image for the same workloads.
        for target in &mut targets {
            if let Some(own) = spec.targets.iter().find(|o| {
                o.workload_name == target.workload_name && o.container_name == target.container_name
            }) {
                if !own.image.is_empty() {
                    target.image = own.image.clone();
                }
            }
        }
        if let Some(captured) = captured_targets(job, root, scope)? {
            for target in &mut targets {
                if let Some(c) = captured.iter().find(|c| c.workload_name == target.workload_name) {
                    target.baseline_replicas = c.baseline_replicas;
                    target.origin_image = c.origin_image.clone();
                }
            }
        }
    }

    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::GrayRelease(GrayTaskSpec {
            scope: cluster,
            gray_scale: spec.gray_scale,
            first_step,
            targets,
            name_suffix: naming::identity_hash(&scope.ctx.workflow_name, scope.ctx.task_id, &root.name),
        }),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn lint_release(
    job: &Job,
    spec: &GrayReleaseJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    if spec.from_job.is_empty() {
        if !(1..100).contains(&spec.gray_scale) {
            return Err(CompileError::GrayScaleOutOfRange {
                job: job.name.clone(),
                scale: spec.gray_scale,
                range: "1-99",
            });
        }
        lint_rollout_targets(job, &spec.targets)?;
        cluster_scope(&job.name, &spec.location, scope.ctx)?;
        return Ok(());
    }
    if !(1..=100).contains(&spec.gray_scale) {
        return Err(CompileError::GrayScaleOutOfRange {
            job: job.name.clone(),
            scale: spec.gray_scale,
            range: "1-100",
        });
    }
    let (root, _) = chain_root(job, spec, scope)?;
    if !scope.in_earlier_stage(&job.name, &root.name) {
        return Err(CompileError::OriginNotUpstream { job: job.name.clone(), from: root.name.clone() });
    }
    Ok(())
}

pub fn to_rollback_jobs(
    job: &Job,
    spec: &GrayRollbackJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::GrayRollback(GrayRollbackTaskSpec {
            scope: cluster_scope(&job.name, &spec.location, scope.ctx)?,
            workloads: spec.workloads.clone(),
        }),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn lint_rollback(
    job: &Job,
    spec: &GrayRollbackJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    if spec.workloads.is_empty() {
        return Err(CompileError::missing(&job.name, "workloads"));
    }
    cluster_scope(&job.name, &spec.location, scope.ctx)?;
    Ok(())
}

#[cfg(test)]
#[path = "gray_tests.rs"]
mod tests;
