// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text and JSON rendering of workflow tasks.

use crate::color;
use chrono::{TimeZone, Utc};
use clap::ValueEnum;
use cv_core::{StageTask, WorkflowTask};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// UTC wall-clock time, or `-` when unset.
pub fn format_time(epoch_secs: i64) -> String {
    if epoch_secs <= 0 {
        return "-".to_string();
    }
    match Utc.timestamp_opt(epoch_secs, 0).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Compact elapsed time between two epoch seconds (e.g. "42s", "3m05s", "1h02m").
pub fn format_elapsed(start: i64, end: i64) -> String {
    if start <= 0 || end < start {
        return "-".to_string();
    }
    let secs = end - start;
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m{:02}s", s / 60, s % 60),
        s => format!("{}h{:02}m", s / 3600, (s % 3600) / 60),
    }
}

/// One line per task, for listings.
pub fn task_line(task: &WorkflowTask) -> String {
    format!(
        "#{:<4} {:<10} {}  {}  {}",
        task.task_id,
        color::status(task.status),
        format_time(task.create_time),
        format_elapsed(task.start_time, task.end_time),
        color::muted(&task.task_creator),
    )
}

fn stage_block(out: &mut String, stage: &StageTask) {
    let mode = if stage.parallel { " (parallel)" } else { "" };
    let _ = writeln!(
        out,
        "  {}{} {} {}",
        color::header(&stage.name),
        mode,
        color::status(stage.status),
        format_elapsed(stage.start_time, stage.end_time)
    );
    if let Some(approval) = &stage.approval {
        let _ = writeln!(
            out,
            "    approval {} ({}/{} approvals)",
            color::status(approval.status),
            approval.approvals(),
            approval.needed()
        );
        for decision in &approval.decisions {
            let verdict = if decision.approved { "approved" } else { "rejected" };
            let comment =
                if decision.comment.is_empty() { String::new() } else { format!(": {}", decision.comment) };
            let _ = writeln!(out, "      {} {}{}", decision.user, verdict, color::context(&comment));
        }
    }
    if !stage.error.is_empty() {
        let _ = writeln!(out, "    error: {}", stage.error);
    }
    let width = stage.jobs.iter().map(|j| j.key.len()).max().unwrap_or(0);
    for job in &stage.jobs {
        let _ = write!(
            out,
            "    {:<width$}  {} {}",
            job.key,
            color::status(job.status),
            format_elapsed(job.start_time, job.end_time),
            width = width
        );
        if !job.error.is_empty() {
            let _ = write!(out, "  {}", color::context(&job.error));
        }
        out.push('\n');
    }
}

/// Full task detail: stages, approvals and jobs.
pub fn task_detail(task: &WorkflowTask) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} #{} {}",
        color::header(&task.workflow_name),
        task.task_id,
        color::status(task.status)
    );
    let _ = writeln!(
        out,
        "  created {} by {}, ran {}",
        format_time(task.create_time),
        if task.task_creator.is_empty() { "-" } else { task.task_creator.as_str() },
        format_elapsed(task.start_time, task.end_time)
    );
    for stage in &task.stages {
        stage_block(&mut out, stage);
    }
    let ignored = task.ignored_failures();
    if !ignored.is_empty() {
        let keys: Vec<&str> = ignored.iter().map(|j| j.key.as_str()).collect();
        let _ = writeln!(out, "  ignored failures: {}", keys.join(", "));
    }
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
