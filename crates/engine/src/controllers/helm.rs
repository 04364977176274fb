// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{settled, JobRun, StepResult};
use cv_core::task::HelmTaskSpec;

/// Upgrade (or install) the release under the job's deadline.
pub(super) async fn run(run: &JobRun, spec: &HelmTaskSpec) -> StepResult {
    let helm = run.deps.helm.clone();
    let outcome = run.call(async move { helm.upgrade(spec).await.map_err(|e| e.to_string()) }).await;
    settled(outcome)?;
    tracing::info!(release = %spec.release_name, chart = %spec.chart, namespace = %spec.scope.namespace, "helm release upgraded");
    Ok(())
}

#[cfg(test)]
#[path = "helm_tests.rs"]
mod tests;
