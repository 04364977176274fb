// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cv: the Conveyor command line

mod color;
mod commands;
mod definition;
mod exit_error;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cv_engine::EngineConfig;
use exit_error::ExitError;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("CV_GIT_HASH"));

#[derive(Parser)]
#[command(name = "cv", version = VERSION, about = "Conveyor workflow engine", styles = color::styles())]
struct Cli {
    /// Engine config file (TOML)
    #[arg(long, global = true, env = "CV_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a workflow definition without running it
    Lint(commands::lint::LintArgs),
    /// Create a task from a workflow definition and run it to completion
    Run(commands::run::RunArgs),
    /// Show stored tasks of a workflow
    Show(commands::show::ShowArgs),
    /// Execute a job context's steps on this host (worker entrypoint)
    StepRunner(commands::step_runner::StepRunnerArgs),
}

/// Load the engine config and start logging under its state dir.
fn setup(path: Option<&PathBuf>) -> Result<(EngineConfig, logging::Guard)> {
    let config = EngineConfig::load(path.map(PathBuf::as_path))?;
    let guard = logging::init(Some(&config.state_dir()?))?;
    Ok((config, guard))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Lint(args) => {
            let (config, _guard) = setup(cli.config.as_ref())?;
            commands::lint::handle(args, &config)
        }
        Command::Run(args) => {
            let (config, _guard) = setup(cli.config.as_ref())?;
            commands::run::handle(args, &config).await
        }
        Command::Show(args) => {
            let (config, _guard) = setup(cli.config.as_ref())?;
            commands::show::handle(args, &config)
        }
        Command::StepRunner(args) => {
            // Step runner output is the job log; diagnostics go to stderr only
            let _guard = logging::init(None)?;
            commands::step_runner::handle(args).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        let code = match err.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                exit.code
            }
            None => {
                eprintln!("error: {:#}", err);
                exit_error::FAILURE
            }
        };
        std::process::exit(code);
    }
}
