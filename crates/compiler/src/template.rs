// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `{{.job.<key>.<output>}}`, `{{.workflow.params.<name>}}` and patch
//! `{{.<param>}}` placeholders.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `{{.job.<job-key>.<output>}}`. Keys contain dots, outputs never do.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static OUTPUT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.job\.([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.workflow\.params\.([A-Za-z0-9_\-]+)\s*\}\}")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static PATCH_PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("constant regex pattern is valid")
});

/// A reference to an upstream job task's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub job_key: String,
    pub output: String,
}

impl OutputRef {
    /// Definition job name: the first segment of the key.
    pub fn job_name(&self) -> &str {
        self.job_key.split('.').next().unwrap_or(&self.job_key)
    }
}

impl std::fmt::Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{{.job.{}.{}}}}}", self.job_key, self.output)
    }
}

pub fn output_refs(text: &str) -> Vec<OutputRef> {
    OUTPUT_PATTERN
        .captures_iter(text)
        .map(|caps| OutputRef { job_key: caps[1].to_string(), output: caps[2].to_string() })
        .collect()
}

pub fn param_refs(text: &str) -> Vec<String> {
    PARAM_PATTERN.captures_iter(text).map(|caps| caps[1].to_string()).collect()
}

/// Substitute output references. Fails on the first reference `lookup`
/// cannot resolve.
pub fn render_outputs<F>(text: &str, lookup: F) -> Result<String, OutputRef>
where
    F: Fn(&OutputRef) -> Option<String>,
{
    let mut missing = None;
    let rendered = OUTPUT_PATTERN.replace_all(text, |caps: &regex::Captures| {
        let reference = OutputRef { job_key: caps[1].to_string(), output: caps[2].to_string() };
        match lookup(&reference) {
            Some(value) => value,
            None => {
                if missing.is_none() {
                    missing = Some(reference);
                }
                caps[0].to_string()
            }
        }
    });
    match missing {
        Some(reference) => Err(reference),
        None => Ok(rendered.into_owned()),
    }
}

/// Substitute workflow parameters. Unknown names are left as-is.
pub fn render_params(text: &str, params: &HashMap<String, String>) -> String {
    PARAM_PATTERN
        .replace_all(text, |caps: &regex::Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Substitute `{{.name}}` patch parameters. Unknown names are left as-is.
pub fn render_patch(text: &str, params: &HashMap<&str, &str>) -> String {
    PATCH_PARAM_PATTERN
        .replace_all(text, |caps: &regex::Captures| match params.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
