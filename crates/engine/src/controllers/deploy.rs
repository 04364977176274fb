// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image updates of a service's workload.

use super::{k8s, JobRun, StepResult};
use cv_core::task::DeployTaskSpec;

pub(super) async fn run(run: &JobRun, spec: &DeployTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();

    let mut deployment = k8s::get_deployment(&cluster, namespace, &spec.workload_name).await?;
    for container in &spec.containers {
        k8s::set_image(&mut deployment, &container.name, &container.image)?;
    }
    run.checkpoint()?;
    k8s::apply(&cluster, namespace, &deployment).await?;
    tracing::info!(
        %namespace,
        service = %spec.service_name,
        deployment = %spec.workload_name,
        containers = spec.containers.len(),
        "updated images"
    );

    if spec.skip_check_run_status {
        return Ok(());
    }
    k8s::wait_ready(run, &cluster, namespace, &spec.workload_name).await
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
