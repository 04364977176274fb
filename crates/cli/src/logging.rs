// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup: stderr always, plus `cv.log` under the state dir.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "cv.log";

/// Keeps the file writer flushing until dropped.
pub struct Guard {
    _file: Option<WorkerGuard>,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(state_dir: Option<&Path>) -> std::io::Result<Guard> {
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false).compact();

    let Some(dir) = state_dir else {
        tracing_subscriber::registry().with(filter()).with(stderr).init();
        return Ok(Guard { _file: None });
    };

    std::fs::create_dir_all(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
    tracing_subscriber::registry()
        .with(filter())
        .with(stderr)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(Guard { _file: Some(guard) })
}
