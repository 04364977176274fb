// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conveyor job spec compiler
//!
//! Turns a workflow definition plus run-time arguments into stage tasks
//! holding fully resolved job tasks. Compilation is pure: the same
//! definition, arguments and context always produce the same keys, names
//! and specs.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod context;
pub mod error;
pub mod jobs;
pub mod lint;
pub mod merge;
pub mod naming;
pub mod resolve;
pub mod scope;
pub mod slug;
pub mod template;

pub use context::{CompileContext, Feature};
pub use error::CompileError;
pub use scope::CompileScope;
pub use template::OutputRef;

use cv_core::{ApprovalRecord, JobTask, StageTask, TaskStatus, WorkflowArgs, WorkflowDefinition};
use std::collections::{HashMap, HashSet};

/// Apply run-time arguments and defaults to a stored definition.
///
/// Parameters are overlaid by name and substituted into every job; run-time
/// jobs overlay the definition job of the same name and type.
pub fn prepare(
    def: &WorkflowDefinition,
    args: &WorkflowArgs,
    ctx: &CompileContext,
) -> Result<WorkflowDefinition, CompileError> {
    let mut def = def.clone();
    for kv in &args.params {
        let Some(param) = def.params.iter_mut().find(|p| p.name == kv.key) else {
            return Err(CompileError::UnknownParam(kv.key.clone()));
        };
        param.value = kv.value.clone();
    }
    for runtime in &args.jobs {
        let Some(job) = def.find_job_mut(&runtime.name) else {
            return Err(CompileError::UnknownJob(runtime.name.clone()));
        };
        jobs::merge_args(job, runtime)?;
    }

    let params: HashMap<String, String> =
        def.params.iter().map(|p| (p.name.clone(), p.value.clone())).collect();
    for job in def.stages.iter_mut().flat_map(|s| s.jobs.iter_mut()) {
        jobs::set_preset(job, ctx);
        jobs::visit_texts(job, &mut |text: &mut String| {
            if text.contains("{{") {
                *text = template::render_params(text, &params);
            }
        });
    }
    Ok(def)
}

pub fn lint(def: &WorkflowDefinition, ctx: &CompileContext) -> Result<(), CompileError> {
    lint::lint_workflow(def, ctx)
}

/// Compile one stage. With a live task in scope, keys must not collide with
/// job tasks of other stages.
pub fn compile_stage(scope: &CompileScope<'_>, stage_idx: usize) -> Result<Vec<JobTask>, CompileError> {
    let Some(stage) = scope.def.stages.get(stage_idx) else {
        return Ok(Vec::new());
    };
    let mut tasks = Vec::new();
    for job in &stage.jobs {
        tasks.extend(jobs::to_jobs(job, scope)?);
    }

    let mut seen: HashSet<&str> = scope
        .task
        .iter()
        .flat_map(|t| t.stages.iter().filter(|s| s.name != stage.name))
        .flat_map(|s| s.jobs.iter().map(|j| j.key.as_str()))
        .collect();
    for task in &tasks {
        if !seen.insert(task.key.as_str()) {
            return Err(CompileError::DuplicateKey(task.key.clone()));
        }
    }
    tracing::debug!(stage = %stage.name, jobs = tasks.len(), "compiled stage");
    Ok(tasks)
}

/// Compile every stage of a prepared definition into fresh stage tasks.
pub fn compile_workflow(
    def: &WorkflowDefinition,
    ctx: &CompileContext,
) -> Result<Vec<StageTask>, CompileError> {
    let scope = CompileScope::new(def, ctx);
    let mut keys: HashSet<String> = HashSet::new();
    let mut stages = Vec::with_capacity(def.stages.len());
    for (idx, stage) in def.stages.iter().enumerate() {
        let jobs = compile_stage(&scope, idx)?;
        for job in &jobs {
            if !keys.insert(job.key.clone()) {
                return Err(CompileError::DuplicateKey(job.key.clone()));
            }
        }
        stages.push(StageTask {
            name: stage.name.clone(),
            status: TaskStatus::Created,
            parallel: stage.parallel,
            approval: stage
                .approval
                .as_ref()
                .map(|a| ApprovalRecord::new(a.kind.clone(), a.timeout_mins.saturating_mul(60))),
            jobs,
            error: String::new(),
            start_time: 0,
            end_time: 0,
        });
    }
    Ok(stages)
}

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
