// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Freestyle jobs, plain or expanded once per service module.

use super::{lint_runtime, lint_unique_outputs, module_key, new_task, visit_key_vals};
use crate::context::CompileContext;
use crate::error::CompileError;
use crate::merge;
use crate::resolve;
use crate::scope::CompileScope;
use cv_core::spec::{FreestyleJobSpec, FreestyleKind, Step, StepSpec};
use cv_core::task::FreestyleTaskSpec;
use cv_core::{Job, JobTask, JobTaskSpec, KeyVal, ServiceTarget, TargetSource};

/// Run-time git revisions and variables overlay the stored ones; step
/// names and order stay as defined.
pub fn merge(spec: &mut FreestyleJobSpec, runtime: &FreestyleJobSpec) {
    merge::merge_key_vals(&mut spec.envs, &runtime.envs);
    for rt_step in &runtime.steps {
        let Some(step) = spec.steps.iter_mut().find(|s| s.name == rt_step.name) else {
            continue;
        };
        if let (StepSpec::Git { repos }, StepSpec::Git { repos: rt_repos }) =
            (&mut step.spec, &rt_step.spec)
        {
            merge::merge_repos(repos, rt_repos);
        }
    }
    merge::replace_if_set(&mut spec.services, &runtime.services);
}

/// Deep-copy `steps` for one service target: its repos join the first git
/// step (or a new leading one).
pub fn instantiate_steps(steps: &[Step], target: &ServiceTarget) -> Vec<Step> {
    let mut steps = steps.to_vec();
    if target.repos.is_empty() {
        return steps;
    }
    match steps.iter().position(|s| matches!(s.spec, StepSpec::Git { .. })) {
        Some(i) => {
            if let StepSpec::Git { repos } = &mut steps[i].spec {
                merge::merge_repos(repos, &target.repos);
            }
        }
        None => steps.insert(0, Step::new("git", StepSpec::Git { repos: target.repos.clone() })),
    }
    steps
}

/// Variables for one service target, including `SERVICE_NAME`,
/// `SERVICE_MODULE` and (when known) `IMAGE`.
pub fn target_envs(base: &[KeyVal], target: &ServiceTarget) -> Vec<KeyVal> {
    let mut envs = base.to_vec();
    merge::merge_key_vals(&mut envs, &target.key_vals);
    let mut builtins = vec![
        KeyVal::new("SERVICE_NAME", target.module.service_name.as_str()),
        KeyVal::new("SERVICE_MODULE", target.module.service_module.as_str()),
    ];
    if !target.image.is_empty() {
        builtins.push(KeyVal::new("IMAGE", target.image.as_str()));
    }
    merge::merge_key_vals(&mut envs, &builtins);
    envs
}

/// Registries referenced by docker build and distribute steps.
pub fn step_registries(steps: &[Step], ctx: &CompileContext) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let mut add = |id: &str| {
        let resolved = ctx.registry(id).map(|r| r.id.clone()).unwrap_or_else(|| id.to_string());
        if !resolved.is_empty() && !ids.contains(&resolved) {
            ids.push(resolved);
        }
    };
    for step in steps {
        match &step.spec {
            StepSpec::DockerBuild { registry_id, .. } => add(registry_id),
            StepSpec::DistributeImage { source_registry_id, target_registry_id, .. } => {
                add(source_registry_id);
                add(target_registry_id);
            }
            _ => {}
        }
    }
    ids
}

pub fn to_jobs(
    job: &Job,
    spec: &FreestyleJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let timeout = scope.ctx.timeout_secs(spec.timeout_mins);
    let infrastructure = spec.runtime.infrastructure;
    match spec.kind {
        FreestyleKind::Normal => Ok(vec![new_task(
            job,
            job.name.clone(),
            None,
            JobTaskSpec::Freestyle(FreestyleTaskSpec {
                runtime: spec.runtime.clone(),
                steps: spec.steps.clone(),
                envs: spec.envs.clone(),
                registries: step_registries(&spec.steps, scope.ctx),
            }),
            infrastructure,
            timeout,
            spec.outputs.clone(),
        )]),
        FreestyleKind::Service => {
            let targets =
                resolve::service_targets(scope, &job.name, spec.source, &spec.from_job, &spec.services)?;
            Ok(targets
                .iter()
                .map(|target| {
                    let steps = instantiate_steps(&spec.steps, target);
                    let registries = step_registries(&steps, scope.ctx);
                    new_task(
                        job,
                        module_key(&job.name, &target.module),
                        Some(target.module.clone()),
                        JobTaskSpec::Freestyle(FreestyleTaskSpec {
                            runtime: spec.runtime.clone(),
                            steps,
                            envs: target_envs(&spec.envs, target),
                            registries,
                        }),
                        infrastructure,
                        timeout,
                        spec.outputs.clone(),
                    )
                })
                .collect())
        }
    }
}

pub fn lint(job: &Job, spec: &FreestyleJobSpec, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    lint_unique_outputs(job, &spec.outputs)?;
    lint_runtime(job, &spec.runtime, scope.ctx)?;
    if spec.kind == FreestyleKind::Service && spec.source == TargetSource::FromJob {
        resolve::service_targets(scope, &job.name, spec.source, &spec.from_job, &spec.services)?;
    }
    Ok(())
}

pub fn visit_texts(spec: &mut FreestyleJobSpec, f: &mut dyn FnMut(&mut String)) {
    for step in &mut spec.steps {
        visit_step(step, f);
    }
    visit_key_vals(&mut spec.envs, f);
    for service in &mut spec.services {
        visit_key_vals(&mut service.key_vals, f);
    }
}

/// Visit the template-bearing text fields of one step.
pub fn visit_step(step: &mut Step, f: &mut dyn FnMut(&mut String)) {
    match &mut step.spec {
        StepSpec::Shell { script } => f(script),
        StepSpec::DockerBuild { image, build_args, .. } => {
            f(image);
            f(build_args);
        }
        StepSpec::Archive { destination, .. } => f(destination),
        _ => {}
    }
}
