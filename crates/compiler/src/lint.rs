// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whole-workflow validation.
//!
//! Runs before any task is created. Checks in order: names, parameter
//! references, per-job rules, then output references.

use crate::context::CompileContext;
use crate::error::CompileError;
use crate::jobs;
use crate::scope::CompileScope;
use crate::template;
use cv_core::{Job, WorkflowDefinition};
use std::collections::HashSet;

pub fn lint_workflow(def: &WorkflowDefinition, ctx: &CompileContext) -> Result<(), CompileError> {
    lint_names(def)?;
    lint_param_refs(def)?;
    let scope = CompileScope::new(def, ctx);
    for job in def.jobs() {
        jobs::lint_job(job, &scope)?;
    }
    for job in def.jobs() {
        lint_output_refs(job, &scope)?;
    }
    Ok(())
}

fn lint_names(def: &WorkflowDefinition) -> Result<(), CompileError> {
    let mut stages = HashSet::new();
    for stage in &def.stages {
        if !stages.insert(stage.name.as_str()) {
            return Err(CompileError::DuplicateStage(stage.name.clone()));
        }
    }
    let mut names = HashSet::new();
    for job in def.jobs() {
        if job.name.is_empty() {
            return Err(CompileError::missing("<unnamed>", "name"));
        }
        if !names.insert(job.name.as_str()) {
            return Err(CompileError::DuplicateJob(job.name.clone()));
        }
    }
    Ok(())
}

/// Strings of a job that may carry placeholders.
pub(crate) fn texts(job: &Job) -> Vec<String> {
    let mut copy = job.clone();
    let mut out = Vec::new();
    jobs::visit_texts(&mut copy, &mut |text: &mut String| out.push(text.clone()));
    out
}

fn lint_param_refs(def: &WorkflowDefinition) -> Result<(), CompileError> {
    for job in def.jobs() {
        for text in texts(job) {
            if let Some(name) = template::param_refs(&text).into_iter().find(|n| def.param(n).is_none()) {
                return Err(CompileError::UnknownParam(name));
            }
        }
    }
    Ok(())
}

/// Every output reference must name a job in an earlier stage that
/// declares that output.
fn lint_output_refs(job: &Job, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    for text in texts(job) {
        for reference in template::output_refs(&text) {
            let unknown = || CompileError::UnknownOutputRef {
                job: job.name.clone(),
                reference: reference.to_string(),
            };
            let Some(upstream) = scope.def.find_job(reference.job_name()) else {
                return Err(unknown());
            };
            if !scope.in_earlier_stage(&job.name, &upstream.name) {
                return Err(CompileError::OutputNotUpstream {
                    job: job.name.clone(),
                    reference: reference.to_string(),
                });
            }
            if !upstream.spec.declared_outputs().contains(&reference.output) {
                return Err(unknown());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lint_tests.rs"]
mod tests;
