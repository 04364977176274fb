// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canary deploy and release.
//!
//! The canary is a copy of the origin deployment running the new image with
//! a share of the origin's replicas. Its pods keep the origin's labels, so
//! the existing Service routes to both; the extra [`CANARY_LABEL`] keeps
//! the two deployments' selectors apart.

use super::{fail, k8s, JobRun, StepResult};
use cv_core::task::CanaryTaskSpec;

/// Label distinguishing canary pods from origin pods.
pub const CANARY_LABEL: &str = "conveyor-canary";

pub(super) async fn deploy(run: &JobRun, spec: &CanaryTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();
    for target in &spec.targets {
        run.checkpoint()?;
        let origin = k8s::get_deployment(&cluster, namespace, &target.workload_name).await?;
        let name = spec.canary_name(&target.workload_name);
        let replicas = k8s::scaled_replicas(k8s::replicas(&origin), spec.percentage);

        let mut canary = k8s::copy_as(&origin, &name);
        k8s::set_replicas(&mut canary, replicas);
        k8s::add_selector_label(&mut canary, CANARY_LABEL, &spec.name_suffix);
        k8s::set_image(&mut canary, &target.container_name, &target.image)?;
        k8s::apply(&cluster, namespace, &canary).await?;
        tracing::info!(%namespace, deployment = %name, replicas, percentage = spec.percentage, "created canary");

        k8s::wait_ready(run, &cluster, namespace, &name).await?;
    }
    Ok(())
}

/// Roll the new image onto the origin, then drop the canary.
pub(super) async fn release(run: &JobRun, spec: &CanaryTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();
    for target in &spec.targets {
        run.checkpoint()?;
        let mut origin = k8s::get_deployment(&cluster, namespace, &target.workload_name).await?;
        k8s::set_image(&mut origin, &target.container_name, &target.image)?;
        k8s::apply(&cluster, namespace, &origin).await?;
        k8s::wait_ready(run, &cluster, namespace, &target.workload_name).await?;

        let name = spec.canary_name(&target.workload_name);
        cluster.delete_deployment(namespace, &name).await.map_err(fail)?;
        tracing::info!(%namespace, deployment = %target.workload_name, canary = %name, "released canary");
    }
    Ok(())
}

pub(super) async fn clean(run: &JobRun, spec: &CanaryTaskSpec) -> Result<(), String> {
    let cluster = run.deps.clusters.get(&spec.scope.cluster_id).map_err(|e| e.to_string())?;
    let mut errors = Vec::new();
    for target in &spec.targets {
        let name = spec.canary_name(&target.workload_name);
        if let Err(e) = cluster.delete_deployment(&spec.scope.namespace, &name).await {
            errors.push(e.to_string());
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

#[cfg(test)]
#[path = "canary_tests.rs"]
mod tests;
