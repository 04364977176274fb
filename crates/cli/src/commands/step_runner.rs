// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step runner: executes a job context's steps on this host.
//!
//! stdout carries the job log followed by a single report line; the
//! worker that launched us parses the report from the end of the log.

use crate::exit_error::{ExitError, FAILURE};
use anyhow::{Context, Result};
use clap::Args;
use cv_adapters::worker::CONTEXT_ENV;
use cv_adapters::{RunDirs, RunOutcome, StepRunner};
use cv_core::JobContext;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct StepRunnerArgs {
    /// Root of the workspace, outputs, artifacts and debug dirs
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Pre-installed tools laid out as <name>/<version>/bin
    #[arg(long)]
    pub tools_dir: Option<PathBuf>,
}

fn read_context() -> Result<JobContext> {
    let raw = std::env::var(CONTEXT_ENV).with_context(|| format!("{} is not set", CONTEXT_ENV))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid job context in {}", CONTEXT_ENV))
}

pub async fn handle(args: StepRunnerArgs) -> Result<()> {
    let ctx = read_context()?;
    let mut runner = StepRunner::new(RunDirs::under(args.root.clone()));
    if let Some(tools) = args.tools_dir {
        runner = runner.with_tools_dir(tools);
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    tracing::info!(steps = ctx.steps.len(), root = %args.root.display(), "running steps");
    let report = runner.run(&ctx, &cancel).await;
    print!("{}", report.log);
    if !report.log.is_empty() && !report.log.ends_with('\n') {
        println!();
    }
    println!("{}", report.to_line()?);

    match report.outcome {
        RunOutcome::Passed => Ok(()),
        outcome => {
            tracing::info!(%outcome, error = %report.error, "steps did not pass");
            Err(ExitError::new(FAILURE, String::new()).into())
        }
    }
}
