// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic names for resources a rollout creates.

use sha2::{Digest, Sha256};

/// First 8 hex chars of sha256 over the workflow/task/job identity.
///
/// Stable across recompiles of the same task, distinct across tasks.
pub fn identity_hash(workflow: &str, task_id: i64, job: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(workflow.as_bytes());
    hasher.update([0u8]);
    hasher.update(task_id.to_be_bytes());
    hasher.update([0u8]);
    hasher.update(job.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(4).map(|b| format!("{:02x}", b)).collect()
}

/// Label value identifying the blue side of a blue-green deploy.
pub fn blue_green_version(workflow: &str, task_id: i64, job: &str) -> String {
    format!("blue-{}", identity_hash(workflow, task_id, job))
}

/// Split `registry/ns/name:tag` into (`name`, `tag`); tag defaults to `latest`.
pub fn split_image(image: &str) -> (&str, &str) {
    let last = image.rsplit('/').next().unwrap_or(image);
    match last.split_once(':') {
        Some((name, tag)) => (name, tag),
        None => (last, "latest"),
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
