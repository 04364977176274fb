// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::rollout::RolloutLocation;
use crate::types::{GroupVersionKind, KeyVal, PatchStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatchJobSpec {
    #[serde(flatten)]
    pub location: RolloutLocation,
    #[serde(default)]
    pub items: Vec<PatchItem>,
    #[serde(default)]
    pub timeout_mins: u64,
}

/// One resource to patch. `patch_content` may reference `{{.name}}` params.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatchItem {
    pub resource_name: String,
    #[serde(flatten)]
    pub gvk: GroupVersionKind,
    #[serde(default)]
    pub patch_strategy: PatchStrategy,
    pub patch_content: String,
    #[serde(default)]
    pub params: Vec<KeyVal>,
}
