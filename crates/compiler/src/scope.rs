// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::context::CompileContext;
use crate::error::CompileError;
use cv_core::{Job, WorkflowDefinition, WorkflowTask};

/// What a job is compiled against: the frozen definition, the live task
/// (absent for the dry compile at task creation) and the context.
#[derive(Clone, Copy)]
pub struct CompileScope<'a> {
    pub def: &'a WorkflowDefinition,
    pub task: Option<&'a WorkflowTask>,
    pub ctx: &'a CompileContext,
}

impl<'a> CompileScope<'a> {
    pub fn new(def: &'a WorkflowDefinition, ctx: &'a CompileContext) -> Self {
        Self { def, task: None, ctx }
    }

    pub fn with_task(mut self, task: &'a WorkflowTask) -> Self {
        self.task = Some(task);
        self
    }

    /// (stage index, job index) of a job in document order.
    pub fn position(&self, name: &str) -> Option<(usize, usize)> {
        self.def.stages.iter().enumerate().find_map(|(si, stage)| {
            stage.jobs.iter().position(|j| j.name == name).map(|ji| (si, ji))
        })
    }

    /// Resolve `from` as an origin of `job`: it must exist and come before
    /// `job` in document order. Self and forward references are errors.
    pub fn origin(&self, job: &str, from: &str) -> Result<&'a Job, CompileError> {
        let Some(from_pos) = self.position(from) else {
            return Err(CompileError::UnknownOriginJob { job: job.into(), from: from.into() });
        };
        let job_pos = self.position(job);
        if job == from || job_pos.is_some_and(|pos| from_pos >= pos) {
            return Err(CompileError::OriginNotUpstream { job: job.into(), from: from.into() });
        }
        Ok(&self.def.stages[from_pos.0].jobs[from_pos.1])
    }

    /// Whether `from` sits in a stage strictly before `job`'s stage.
    pub fn in_earlier_stage(&self, job: &str, from: &str) -> bool {
        match (self.position(job), self.position(from)) {
            (Some((js, _)), Some((fs, _))) => fs < js,
            _ => false,
        }
    }
}
