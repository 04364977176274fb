// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run command handler: create a task and drive it to completion in-process.

use super::{open_store, DefinitionArgs};
use crate::exit_error::ExitError;
use crate::output::{print_json, task_detail, OutputFormat};
use anyhow::Result;
use clap::Args;
use cv_adapters::WebhookNotifier;
use cv_engine::ack::NoAck;
use cv_engine::{Ack, Engine, EngineConfig, EngineError, NotifyingAck};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: DefinitionArgs,
    /// Recorded as the task creator
    #[arg(long, env = "USER", default_value = "cv")]
    pub creator: String,
    /// Approve every manual approval gate as it opens
    #[arg(long)]
    pub auto_approve: bool,
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

fn ack_hook(config: &EngineConfig) -> Result<Arc<dyn Ack>> {
    if !config.notify {
        return Ok(Arc::new(NoAck));
    }
    let notifier = WebhookNotifier::new()?;
    Ok(Arc::new(NotifyingAck::new(Arc::new(notifier))))
}

pub async fn handle(args: RunArgs, config: &EngineConfig) -> Result<()> {
    let (def, run_args) = args.input.load()?;
    let store = Arc::new(open_store(config)?);
    let engine = Engine::from_config(config, store, ack_hook(config)?, args.auto_approve).await?;

    let task = match engine.create_task(&def, &run_args, &args.creator) {
        Ok(task) => task,
        Err(EngineError::Compile(e)) => return Err(ExitError::invalid(format!("{}: {}", def.name, e)).into()),
        Err(e) => return Err(e.into()),
    };
    eprintln!("created {}#{}", task.workflow_name, task.task_id);

    let run = engine.run(&task.workflow_name, task.task_id);
    tokio::pin!(run);
    let status = tokio::select! {
        status = &mut run => status?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(workflow = %task.workflow_name, task_id = task.task_id, "interrupted");
            engine.cancel(&task.workflow_name, task.task_id)?;
            run.await?
        }
    };

    let settled = engine.task(&task.workflow_name, task.task_id)?;
    match args.format {
        OutputFormat::Json => print_json(&settled)?,
        OutputFormat::Text => print!("{}", task_detail(&settled)),
    }
    match ExitError::for_status(status) {
        Some(exit) => Err(exit.into()),
        None => Ok(()),
    }
}
