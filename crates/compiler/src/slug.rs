// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slugs for job task names, image tags and generated resource names.

/// Longest DNS-1123 label the cluster accepts.
pub const MAX_NAME_LEN: usize = 63;

/// Lowercase `input` and collapse every run of characters outside
/// `[a-z0-9]` into a single hyphen, trimmed and capped at `max_len`.
///
/// Truncation prefers the last hyphen inside the limit.
pub fn slugify(input: &str, max_len: usize) -> String {
    let lower = input.to_lowercase();

    let mut slug = String::with_capacity(lower.len());
    let mut last_was_hyphen = true;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    let mut result = slug.trim_end_matches('-').to_string();

    if result.len() > max_len {
        match result[..max_len].rfind('-') {
            Some(pos) if pos > 0 => result.truncate(pos),
            _ => result.truncate(max_len),
        }
    }
    result.trim_end_matches('-').to_string()
}

/// Name of a job task derived from its key.
pub fn task_name(key: &str) -> String {
    slugify(key, MAX_NAME_LEN)
}

/// Docker tag fragment for a git reference (`feature/x` → `feature-x`).
pub fn tag_fragment(reference: &str) -> String {
    slugify(reference, 40)
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
