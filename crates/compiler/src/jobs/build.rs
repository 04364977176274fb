// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build jobs: one freestyle task per service module, ending in an image push.

use super::{lint_runtime, lint_unique_outputs, module_key, new_task, preset_runtime, visit_key_vals};
use crate::context::CompileContext;
use crate::error::CompileError;
use crate::merge;
use crate::scope::CompileScope;
use crate::slug;
use cv_core::spec::{BuildJobSpec, ServiceAndBuild, Step, StepSpec};
use cv_core::task::FreestyleTaskSpec;
use cv_core::{Job, JobTask, JobTaskSpec, KeyVal, Registry, ServiceTarget};

pub const IMAGE_OUTPUT: &str = "IMAGE";

pub fn preset(spec: &mut BuildJobSpec, ctx: &CompileContext) {
    if spec.docker_registry_id.is_empty() {
        if let Some(registry) = ctx.default_registry() {
            spec.docker_registry_id = registry.id.clone();
        }
    }
    for sb in &mut spec.service_and_builds {
        if sb.image_name.is_empty() {
            sb.image_name = sb.module.service_module.clone();
        }
        if sb.build.dockerfile.is_empty() {
            sb.build.dockerfile = "Dockerfile".to_string();
        }
        if sb.build.docker_context.is_empty() {
            sb.build.docker_context = ".".to_string();
        }
        preset_runtime(&mut sb.build.runtime, ctx);
    }
}

/// The run-time list selects which modules build; their repos and
/// variables overlay the stored ones.
pub fn merge(spec: &mut BuildJobSpec, runtime: &BuildJobSpec) {
    merge::take_if_set(&mut spec.docker_registry_id, &runtime.docker_registry_id);
    if runtime.service_and_builds.is_empty() {
        return;
    }
    spec.service_and_builds
        .retain(|sb| runtime.service_and_builds.iter().any(|r| r.module == sb.module));
    for sb in &mut spec.service_and_builds {
        if let Some(rt) = runtime.service_and_builds.iter().find(|r| r.module == sb.module) {
            merge::merge_repos(&mut sb.repos, &rt.repos);
            merge::merge_key_vals(&mut sb.key_vals, &rt.key_vals);
        }
    }
}

fn registry<'a>(job: &str, spec: &BuildJobSpec, ctx: &'a CompileContext) -> Result<&'a Registry, CompileError> {
    ctx.registry(&spec.docker_registry_id).ok_or_else(|| CompileError::UnknownRegistry {
        job: job.to_string(),
        registry: spec.docker_registry_id.clone(),
    })
}

/// `{registry}/{namespace}/{image}:{task_id}-{ref}`; the ref comes from the
/// first repo, and a module without repos is tagged with the task id alone.
pub fn image_for(registry: &Registry, task_id: i64, sb: &ServiceAndBuild) -> String {
    let name = if sb.image_name.is_empty() { &sb.module.service_module } else { &sb.image_name };
    let tag = match sb.repos.first() {
        Some(repo) => format!("{}-{}", task_id, slug::tag_fragment(&repo.reference())),
        None => task_id.to_string(),
    };
    format!("{}/{}:{}", registry.prefix(), name, tag)
}

pub fn targets(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &BuildJobSpec,
) -> Result<Vec<ServiceTarget>, CompileError> {
    let registry = registry(job, spec, scope.ctx)?;
    Ok(spec
        .service_and_builds
        .iter()
        .map(|sb| ServiceTarget {
            module: sb.module.clone(),
            image: image_for(registry, scope.ctx.task_id, sb),
            repos: sb.repos.clone(),
            key_vals: sb.key_vals.clone(),
        })
        .collect())
}

pub fn to_jobs(
    job: &Job,
    spec: &BuildJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let registry = registry(&job.name, spec, scope.ctx)?;
    let mut tasks = Vec::with_capacity(spec.service_and_builds.len());
    for sb in &spec.service_and_builds {
        let image = image_for(registry, scope.ctx.task_id, sb);
        let script = &sb.build;

        let mut steps = Vec::new();
        if !script.installs.is_empty() {
            steps.push(Step::new("tools", StepSpec::Tools { installs: script.installs.clone() }));
        }
        if !sb.repos.is_empty() {
            steps.push(Step::new("git", StepSpec::Git { repos: sb.repos.clone() }));
        }
        if !script.script.trim().is_empty() {
            steps.push(Step::shell("build", script.script.clone()));
        }
        steps.push(Step::new(
            "docker-build",
            StepSpec::DockerBuild {
                context: script.docker_context.clone(),
                dockerfile: script.dockerfile.clone(),
                image: image.clone(),
                build_args: script.build_args.clone(),
                registry_id: registry.id.clone(),
            },
        ));

        let mut envs = sb.key_vals.clone();
        merge::merge_key_vals(
            &mut envs,
            &[
                KeyVal::new(IMAGE_OUTPUT, image.as_str()),
                KeyVal::new("SERVICE_NAME", sb.module.service_name.as_str()),
                KeyVal::new("SERVICE_MODULE", sb.module.service_module.as_str()),
            ],
        );

        let mut outputs = vec![IMAGE_OUTPUT.to_string()];
        for out in &script.outputs {
            if !outputs.contains(out) {
                outputs.push(out.clone());
            }
        }

        tasks.push(new_task(
            job,
            module_key(&job.name, &sb.module),
            Some(sb.module.clone()),
            JobTaskSpec::Freestyle(FreestyleTaskSpec {
                runtime: script.runtime.clone(),
                steps,
                envs,
                registries: vec![registry.id.clone()],
            }),
            script.runtime.infrastructure,
            scope.ctx.timeout_secs(script.timeout_mins),
            outputs,
        ));
    }
    Ok(tasks)
}

pub fn lint(job: &Job, spec: &BuildJobSpec, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    if spec.service_and_builds.is_empty() {
        return Err(CompileError::missing(&job.name, "service_and_builds"));
    }
    for sb in &spec.service_and_builds {
        lint_unique_outputs(job, &sb.build.outputs)?;
        if sb.build.outputs.iter().any(|o| o == IMAGE_OUTPUT) {
            return Err(CompileError::DuplicateOutput {
                job: job.name.clone(),
                output: IMAGE_OUTPUT.to_string(),
            });
        }
    }
    for sb in &spec.service_and_builds {
        lint_runtime(job, &sb.build.runtime, scope.ctx)?;
    }
    registry(&job.name, spec, scope.ctx)?;
    Ok(())
}

pub fn visit_texts(spec: &mut BuildJobSpec, f: &mut dyn FnMut(&mut String)) {
    for sb in &mut spec.service_and_builds {
        f(&mut sb.build.script);
        f(&mut sb.build.build_args);
        visit_key_vals(&mut sb.key_vals, f);
    }
}
