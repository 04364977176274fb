// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use cv_core::TaskStatus;
use std::io::IsTerminal;

pub mod codes {
    pub const HEADER: u8 = 74;
    pub const LITERAL: u8 = 250;
    pub const CONTEXT: u8 = 245;
    pub const MUTED: u8 = 240;
    pub const PASSED: u8 = 114;
    pub const FAILED: u8 = 174;
    /// Waiting and running
    pub const ACTIVE: u8 = 179;
}

/// `NO_COLOR=1` wins over `COLOR=1`; otherwise color only on a terminal.
pub fn should_colorize() -> bool {
    let set = |name: &str| std::env::var(name).is_ok_and(|v| v == "1");
    if set("NO_COLOR") {
        return false;
    }
    set("COLOR") || std::io::stdout().is_terminal()
}

fn fg(code: u8) -> Style {
    Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))))
}

/// Help output styles in the same palette as task output.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(fg(codes::HEADER))
        .literal(fg(codes::LITERAL))
        .placeholder(fg(codes::CONTEXT))
}

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn context(text: &str) -> String {
    paint(codes::CONTEXT, text)
}

pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text)
}

/// A status word colored by outcome.
pub fn status(status: TaskStatus) -> String {
    let code = match status {
        TaskStatus::Passed => codes::PASSED,
        TaskStatus::Failed | TaskStatus::Timeout | TaskStatus::Rejected => codes::FAILED,
        TaskStatus::Waiting | TaskStatus::Running => codes::ACTIVE,
        TaskStatus::Created | TaskStatus::Cancelled | TaskStatus::Skipped => codes::MUTED,
    };
    paint(code, &status.to_string())
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
