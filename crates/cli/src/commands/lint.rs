// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lint command handler

use super::DefinitionArgs;
use crate::exit_error::ExitError;
use anyhow::Result;
use clap::Args;
use cv_compiler::{compile_workflow, lint, prepare};
use cv_engine::EngineConfig;

#[derive(Args, Debug)]
pub struct LintArgs {
    #[command(flatten)]
    pub input: DefinitionArgs,
}

pub fn handle(args: LintArgs, config: &EngineConfig) -> Result<()> {
    let (def, run_args) = args.input.load()?;
    let ctx = config.compile_context(&def.name);
    let checked = prepare(&def, &run_args, &ctx)
        .and_then(|prepared| lint(&prepared, &ctx).map(|_| prepared))
        .and_then(|prepared| compile_workflow(&prepared, &ctx));
    let stages = match checked {
        Ok(stages) => stages,
        Err(e) => {
            tracing::debug!(workflow = %def.name, error = %e, "lint failed");
            return Err(ExitError::invalid(format!("{}: {}", def.name, e)).into());
        }
    };
    let jobs: usize = stages.iter().map(|s| s.jobs.len()).sum();
    println!("ok: {} ({} stages, {} jobs)", def.name, stages.len(), jobs);
    Ok(())
}

#[cfg(test)]
#[path = "lint_tests.rs"]
mod tests;
