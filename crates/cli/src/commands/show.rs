// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Show command handler

use super::open_store;
use crate::output::{print_json, task_detail, task_line, OutputFormat};
use anyhow::{anyhow, Result};
use clap::Args;
use cv_engine::EngineConfig;
use cv_storage::TaskStore;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Workflow name
    pub workflow: String,
    /// Task id; lists every task of the workflow when omitted
    pub task_id: Option<i64>,
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub fn handle(args: ShowArgs, config: &EngineConfig) -> Result<()> {
    let store = open_store(config)?;
    match args.task_id {
        Some(task_id) => {
            let task = store
                .find_task(&args.workflow, task_id)?
                .ok_or_else(|| anyhow!("task {}#{} not found", args.workflow, task_id))?;
            match args.format {
                OutputFormat::Json => print_json(&task)?,
                OutputFormat::Text => print!("{}", task_detail(&task)),
            }
        }
        None => {
            let tasks = store.list_tasks(&args.workflow)?;
            match args.format {
                OutputFormat::Json => print_json(&tasks)?,
                OutputFormat::Text if tasks.is_empty() => println!("No tasks for {}", args.workflow),
                OutputFormat::Text => {
                    for task in &tasks {
                        println!("{}", task_line(task));
                    }
                }
            }
        }
    }
    Ok(())
}
