// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image distribution between registries.

use super::{lint_runtime, new_task, preset_runtime};
use crate::context::CompileContext;
use crate::error::CompileError;
use crate::naming;
use crate::resolve;
use crate::scope::CompileScope;
use cv_core::spec::{DistributeImageJobSpec, DistributeTarget, Step, StepSpec};
use cv_core::task::FreestyleTaskSpec;
use cv_core::{Job, JobTask, JobTaskSpec, Registry, ServiceTarget, TargetSource};

pub fn preset(spec: &mut DistributeImageJobSpec, ctx: &CompileContext) {
    if spec.source_registry_id.is_empty() {
        if let Some(registry) = ctx.default_registry() {
            spec.source_registry_id = registry.id.clone();
        }
    }
    preset_runtime(&mut spec.runtime, ctx);
}

fn registry<'a>(job: &str, id: &str, ctx: &'a CompileContext) -> Result<&'a Registry, CompileError> {
    ctx.registry(id).ok_or_else(|| CompileError::UnknownRegistry {
        job: job.to_string(),
        registry: id.to_string(),
    })
}

/// `{target prefix}/{name}:{tag}`, keeping the source tag unless overridden.
pub fn target_image(target_registry: &Registry, source_image: &str, target_tag: &str) -> String {
    let (name, tag) = naming::split_image(source_image);
    let tag = if target_tag.is_empty() { tag } else { target_tag };
    format!("{}/{}:{}", target_registry.prefix(), name, tag)
}

/// Targets with source images filled from the origin job (if any) and
/// target images computed.
pub fn resolved_targets(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &DistributeImageJobSpec,
) -> Result<Vec<DistributeTarget>, CompileError> {
    let target_registry = registry(job, &spec.target_registry_id, scope.ctx)?;
    let mut targets = match spec.source {
        TargetSource::Runtime => spec.targets.clone(),
        TargetSource::FromJob => {
            if spec.from_job.is_empty() {
                return Err(CompileError::missing(job, "from_job"));
            }
            let upstream = resolve::origin_targets(scope, job, &spec.from_job)?;
            let from_upstream = |t: &ServiceTarget| DistributeTarget {
                module: t.module.clone(),
                source_image: t.image.clone(),
                ..DistributeTarget::default()
            };
            if spec.targets.is_empty() {
                upstream.iter().map(from_upstream).collect()
            } else {
                let mut selected = Vec::with_capacity(spec.targets.len());
                for wanted in &spec.targets {
                    let Some(found) = upstream.iter().find(|t| t.module == wanted.module) else {
                        return Err(CompileError::TargetMissing {
                            job: job.to_string(),
                            from: spec.from_job.clone(),
                            target: wanted.module.to_string(),
                        });
                    };
                    let mut target = from_upstream(found);
                    target.target_tag = wanted.target_tag.clone();
                    selected.push(target);
                }
                selected
            }
        }
    };
    for target in &mut targets {
        target.target_image = target_image(target_registry, &target.source_image, &target.target_tag);
    }
    Ok(targets)
}

pub fn targets(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &DistributeImageJobSpec,
) -> Result<Vec<ServiceTarget>, CompileError> {
    Ok(resolved_targets(scope, job, spec)?
        .into_iter()
        .map(|t| ServiceTarget { module: t.module, image: t.target_image, ..ServiceTarget::default() })
        .collect())
}

pub fn to_jobs(
    job: &Job,
    spec: &DistributeImageJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let source = registry(&job.name, &spec.source_registry_id, scope.ctx)?;
    let target = registry(&job.name, &spec.target_registry_id, scope.ctx)?;
    let targets = resolved_targets(scope, &job.name, spec)?;
    let step = Step::new(
        "distribute",
        StepSpec::DistributeImage {
            source_registry_id: source.id.clone(),
            target_registry_id: target.id.clone(),
            targets,
        },
    );
    let mut registries = vec![source.id.clone()];
    if target.id != source.id {
        registries.push(target.id.clone());
    }
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::Freestyle(FreestyleTaskSpec {
            runtime: spec.runtime.clone(),
            steps: vec![step],
            envs: Vec::new(),
            registries,
        }),
        spec.runtime.infrastructure,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn lint(
    job: &Job,
    spec: &DistributeImageJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    lint_runtime(job, &spec.runtime, scope.ctx)?;
    registry(&job.name, &spec.source_registry_id, scope.ctx)?;
    let targets = resolved_targets(scope, &job.name, spec)?;
    if targets.is_empty() && spec.source == TargetSource::Runtime {
        return Err(CompileError::missing(&job.name, "targets"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "distribute_tests.rs"]
mod tests;
