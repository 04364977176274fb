// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reading workflow definitions and run arguments from disk.
//!
//! `.json` files are parsed as JSON; anything else as TOML.

use anyhow::{bail, Context, Result};
use cv_core::{KeyVal, WorkflowArgs, WorkflowDefinition};
use serde::de::DeserializeOwned;
use std::path::Path;

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if is_json(path) {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
    } else {
        toml::from_str(&text).with_context(|| format!("invalid TOML in {}", path.display()))
    }
}

pub fn load_definition(path: &Path) -> Result<WorkflowDefinition> {
    let def: WorkflowDefinition = load(path)?;
    if def.name.is_empty() {
        bail!("{}: workflow has no name", path.display());
    }
    Ok(def)
}

/// Arguments from an optional file, with `--param` pairs applied on top.
pub fn load_args(path: Option<&Path>, params: &[KeyVal]) -> Result<WorkflowArgs> {
    let mut args: WorkflowArgs = match path {
        Some(path) => load(path)?,
        None => WorkflowArgs::default(),
    };
    for param in params {
        match args.params.iter_mut().find(|p| p.key == param.key) {
            Some(existing) => existing.value = param.value.clone(),
            None => args.params.push(param.clone()),
        }
    }
    Ok(args)
}

/// Parse `key=value` for clap.
pub fn parse_param(s: &str) -> Result<KeyVal, String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(KeyVal::new(key, value)),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
