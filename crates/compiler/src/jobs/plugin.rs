// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin jobs: a packaged script run on the plugin's own image.

use super::{lint_runtime, lint_unique_outputs, new_task};
use crate::context::CompileContext;
use crate::error::CompileError;
use crate::scope::CompileScope;
use cv_core::spec::{PluginJobSpec, Step};
use cv_core::task::FreestyleTaskSpec;
use cv_core::{Infrastructure, Job, JobTask, JobTaskSpec};

pub fn preset(spec: &mut PluginJobSpec, ctx: &CompileContext) {
    if spec.runtime.infrastructure == Infrastructure::Kubernetes && spec.runtime.image.is_empty() {
        spec.runtime.image = if spec.plugin.image.is_empty() {
            ctx.default_image.clone()
        } else {
            spec.plugin.image.clone()
        };
    }
}

pub fn to_jobs(
    job: &Job,
    spec: &PluginJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::Freestyle(FreestyleTaskSpec {
            runtime: spec.runtime.clone(),
            steps: vec![Step::shell(spec.plugin.name.as_str(), spec.plugin.script.as_str())],
            envs: spec.plugin.inputs.clone(),
            registries: Vec::new(),
        }),
        spec.runtime.infrastructure,
        scope.ctx.timeout_secs(spec.timeout_mins),
        spec.plugin.outputs.clone(),
    )])
}

pub fn lint(job: &Job, spec: &PluginJobSpec, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    if spec.plugin.script.trim().is_empty() {
        return Err(CompileError::missing(&job.name, "plugin script"));
    }
    lint_unique_outputs(job, &spec.plugin.outputs)?;
    lint_runtime(job, &spec.runtime, scope.ctx)
}
