// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patches of arbitrary namespaced resources.

use super::{fail, JobRun, StepResult};
use cv_core::task::PatchTaskSpec;

/// Every item is attempted; the job fails listing the items that did not apply.
pub(super) async fn run(run: &JobRun, spec: &PatchTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();
    let mut failed = Vec::new();
    for item in &spec.items {
        run.checkpoint()?;
        match cluster
            .patch_unstructured(namespace, &item.gvk, &item.resource_name, item.strategy, &item.patch)
            .await
        {
            Ok(()) => {
                tracing::info!(%namespace, kind = %item.gvk.kind, name = %item.resource_name, "patched resource")
            }
            Err(e) => {
                tracing::warn!(%namespace, kind = %item.gvk.kind, name = %item.resource_name, error = %e, "patch failed");
                failed.push(format!("{} ({})", item.resource_name, e));
            }
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(fail(format!("failed items: {}", failed.join("; "))))
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
