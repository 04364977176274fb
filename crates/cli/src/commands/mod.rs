// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod lint;
pub mod run;
pub mod show;
pub mod step_runner;

use crate::definition::{load_args, load_definition, parse_param};
use anyhow::{Context, Result};
use clap::Args;
use cv_core::{KeyVal, WorkflowArgs, WorkflowDefinition};
use cv_engine::EngineConfig;
use cv_storage::FileTaskStore;
use std::path::PathBuf;

/// Task records file under the state dir
pub const TASKS_FILE: &str = "tasks.zst";

/// A definition file plus the run-time arguments applied to it.
#[derive(Args, Debug)]
pub struct DefinitionArgs {
    /// Workflow definition (TOML, or JSON by extension)
    pub definition: PathBuf,
    /// Run-time arguments file (params and job selections)
    #[arg(long)]
    pub args: Option<PathBuf>,
    /// Parameter override (can be repeated: --param key=value)
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<KeyVal>,
}

impl DefinitionArgs {
    pub fn load(&self) -> Result<(WorkflowDefinition, WorkflowArgs)> {
        let def = load_definition(&self.definition)?;
        let args = load_args(self.args.as_deref(), &self.params)?;
        Ok((def, args))
    }
}

pub fn open_store(config: &EngineConfig) -> Result<FileTaskStore> {
    let path = config.state_dir()?.join(TASKS_FILE);
    FileTaskStore::open(&path).with_context(|| format!("failed to open task store {}", path.display()))
}
