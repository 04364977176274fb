// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Overlay of run-time arguments onto stored definitions.
//!
//! Every merge here is idempotent: applying the same overlay twice yields
//! the same result as applying it once.

use cv_core::{KeyVal, Repo, ServiceTarget};

/// Overlay repos by identity (source, owner, name). Matching repos take the
/// overlay's revision and checkout path; new repos are appended in order.
pub fn merge_repos(base: &mut Vec<Repo>, overlay: &[Repo]) {
    for repo in overlay {
        let identity = repo.identity();
        match base.iter_mut().find(|r| r.identity() == identity) {
            Some(existing) => {
                existing.branch = repo.branch.clone();
                existing.tag = repo.tag.clone();
                existing.pr = repo.pr;
                if !repo.address.is_empty() {
                    existing.address = repo.address.clone();
                }
                if !repo.checkout_path.is_empty() {
                    existing.checkout_path = repo.checkout_path.clone();
                }
            }
            None => base.push(repo.clone()),
        }
    }
}

/// Overlay key/vals by key. Values are replaced; the credential flag of a
/// stored key is kept so a run-time value never un-hides a secret.
pub fn merge_key_vals(base: &mut Vec<KeyVal>, overlay: &[KeyVal]) {
    for kv in overlay {
        match base.iter_mut().find(|b| b.key == kv.key) {
            Some(existing) => {
                existing.value = kv.value.clone();
                existing.is_credential |= kv.is_credential;
            }
            None => base.push(kv.clone()),
        }
    }
}

/// Overlay service targets by (service, module), merging their repos and
/// key/vals and taking a non-empty image.
pub fn merge_targets(base: &mut Vec<ServiceTarget>, overlay: &[ServiceTarget]) {
    for target in overlay {
        match base.iter_mut().find(|b| b.module == target.module) {
            Some(existing) => merge_target(existing, target),
            None => base.push(target.clone()),
        }
    }
}

pub fn merge_target(base: &mut ServiceTarget, overlay: &ServiceTarget) {
    if !overlay.image.is_empty() {
        base.image = overlay.image.clone();
    }
    merge_repos(&mut base.repos, &overlay.repos);
    merge_key_vals(&mut base.key_vals, &overlay.key_vals);
}

/// Replace `base` with `overlay` when the overlay carries a selection.
pub fn replace_if_set<T: Clone>(base: &mut Vec<T>, overlay: &[T]) {
    if !overlay.is_empty() {
        *base = overlay.to_vec();
    }
}

/// Take a non-empty overlay string.
pub fn take_if_set(base: &mut String, overlay: &str) {
    if !overlay.is_empty() {
        *base = overlay.to_string();
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
