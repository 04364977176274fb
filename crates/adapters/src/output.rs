// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job output values, keyed by `(job_key, output_name)`.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

pub trait OutputStore: Send + Sync + 'static {
    /// Record the outputs of a finished job, replacing values of the same name.
    fn put(&self, job_key: &str, outputs: &BTreeMap<String, String>);

    fn get(&self, job_key: &str, name: &str) -> Option<String>;

    fn outputs_of(&self, job_key: &str) -> BTreeMap<String, String>;
}

#[derive(Debug, Default)]
pub struct MemoryOutputStore {
    values: Mutex<HashMap<String, BTreeMap<String, String>>>,
}

impl MemoryOutputStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputStore for MemoryOutputStore {
    fn put(&self, job_key: &str, outputs: &BTreeMap<String, String>) {
        if outputs.is_empty() {
            return;
        }
        let mut values = self.values.lock();
        let entry = values.entry(job_key.to_string()).or_default();
        entry.extend(outputs.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    fn get(&self, job_key: &str, name: &str) -> Option<String> {
        self.values.lock().get(job_key).and_then(|o| o.get(name)).cloned()
    }

    fn outputs_of(&self, job_key: &str) -> BTreeMap<String, String> {
        self.values.lock().get(job_key).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
