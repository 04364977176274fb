// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gray release chains and rollback.
//!
//! A chain runs one gray deployment per workload beside the origin, named
//! after the chain's root job so concurrent chains never share one. Each
//! step resizes the pair against the baseline the first step captured, so
//! `gray + origin == baseline` holds between steps. The origin's original
//! replica count and image are also written to the gray deployment's
//! annotations, which is all rollback needs.

use super::{fail, k8s, JobRun, StepResult};
use cv_adapters::Cluster;
use cv_core::task::{GrayRollbackTaskSpec, GrayTarget, GrayTaskSpec};
use cv_core::JobTaskSpec;
use k8s_openapi::api::apps::v1::Deployment;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Label on gray deployments and their pods, valued with the origin
/// workload's name.
pub const GRAY_LABEL: &str = "conveyor-gray-origin";
pub const ORIGIN_REPLICAS_ANNOTATION: &str = "conveyor.io/gray-origin-replicas";
pub const ORIGIN_IMAGE_ANNOTATION: &str = "conveyor.io/gray-origin-image";
const CONTAINER_ANNOTATION: &str = "conveyor.io/gray-container";
const TASK_ANNOTATION: &str = "conveyor.io/gray-task";

/// Read live replicas and images into the targets and keep them on the job
/// record for later steps of the chain.
async fn capture_baseline(
    run: &JobRun,
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    targets: &mut [GrayTarget],
) -> StepResult {
    for target in targets.iter_mut() {
        let origin = k8s::get_deployment(cluster, namespace, &target.workload_name).await?;
        let image = k8s::container_image(&origin, &target.container_name).ok_or_else(|| {
            fail(format!(
                "container {} not found in deployment {}",
                target.container_name, target.workload_name
            ))
        })?;
        target.baseline_replicas = Some(k8s::replicas(&origin));
        target.origin_image = image;
        tracing::info!(
            %namespace,
            deployment = %target.workload_name,
            baseline = k8s::replicas(&origin),
            "captured gray baseline"
        );
    }
    let captured = targets.to_vec();
    run.record(move |job| {
        if let JobTaskSpec::GrayRelease(spec) = &mut job.spec {
            spec.targets = captured;
        }
    });
    Ok(())
}

async fn scale_step(
    run: &JobRun,
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    name: &str,
    target: &GrayTarget,
    baseline: i32,
    scale: u32,
) -> StepResult {
    let gray_replicas = k8s::scaled_replicas(baseline, scale);
    let mut origin = k8s::get_deployment(cluster, namespace, &target.workload_name).await?;

    let mut gray = k8s::copy_as(&origin, name);
    k8s::set_replicas(&mut gray, gray_replicas);
    k8s::add_selector_label(&mut gray, GRAY_LABEL, &target.workload_name);
    gray.metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(GRAY_LABEL.to_string(), target.workload_name.clone());
    k8s::set_image(&mut gray, &target.container_name, &target.image)?;
    let task = run.task.snapshot();
    gray.metadata.annotations = Some(
        [
            (ORIGIN_REPLICAS_ANNOTATION, baseline.to_string()),
            (ORIGIN_IMAGE_ANNOTATION, target.origin_image.clone()),
            (CONTAINER_ANNOTATION, target.container_name.clone()),
            (TASK_ANNOTATION, format!("{}/{}", task.workflow_name, task.task_id)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
    );
    k8s::apply(cluster, namespace, &gray).await?;
    k8s::wait_ready(run, cluster, namespace, name).await?;

    let origin_replicas = (baseline - gray_replicas).max(0);
    k8s::set_replicas(&mut origin, origin_replicas);
    k8s::apply(cluster, namespace, &origin).await?;
    k8s::wait_ready(run, cluster, namespace, &target.workload_name).await?;
    tracing::info!(
        %namespace,
        deployment = %target.workload_name,
        scale,
        gray = gray_replicas,
        origin = origin_replicas,
        "gray step applied"
    );
    Ok(())
}

/// The last step: the origin takes the new image at full size and the gray
/// deployment goes away.
async fn complete(
    run: &JobRun,
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    name: &str,
    target: &GrayTarget,
    baseline: i32,
) -> StepResult {
    let mut origin = k8s::get_deployment(cluster, namespace, &target.workload_name).await?;
    k8s::set_image(&mut origin, &target.container_name, &target.image)?;
    k8s::set_replicas(&mut origin, baseline);
    k8s::apply(cluster, namespace, &origin).await?;
    k8s::wait_ready(run, cluster, namespace, &target.workload_name).await?;

    cluster.delete_deployment(namespace, name).await.map_err(fail)?;
    tracing::info!(%namespace, deployment = %target.workload_name, replicas = baseline, "gray release completed");
    Ok(())
}

pub(super) async fn release(run: &JobRun, spec: &GrayTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();
    let mut targets = spec.targets.clone();
    if spec.first_step {
        capture_baseline(run, &cluster, namespace, &mut targets).await?;
    }

    for target in &targets {
        run.checkpoint()?;
        let baseline = target
            .baseline_replicas
            .ok_or_else(|| fail(format!("no baseline captured for {}", target.workload_name)))?;
        let name = spec.gray_name(&target.workload_name);
        if spec.gray_scale >= 100 {
            complete(run, &cluster, namespace, &name, target, baseline).await?;
        } else {
            scale_step(run, &cluster, namespace, &name, target, baseline, spec.gray_scale).await?;
        }
    }
    Ok(())
}

/// Gray deployments of `workload` from any chain, by name.
async fn gray_deployments(
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    workload: &str,
) -> StepResult<Vec<Deployment>> {
    let selector: BTreeMap<String, String> = [(GRAY_LABEL.to_string(), workload.to_string())].into_iter().collect();
    cluster.list_deployments(namespace, &selector).await.map_err(fail)
}

/// Restore each origin from its gray deployment's annotations and remove
/// every gray deployment of it.
pub(super) async fn rollback(run: &JobRun, spec: &GrayRollbackTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();
    for workload in &spec.workloads {
        run.checkpoint()?;
        let grays = gray_deployments(&cluster, namespace, workload).await?;
        let Some(gray) = grays.first() else {
            tracing::info!(%namespace, deployment = %workload, "no gray deployment, nothing to roll back");
            continue;
        };
        let name = gray.metadata.name.clone().unwrap_or_default();
        let annotations = k8s::annotations(gray);
        let replicas: i32 = annotations
            .get(ORIGIN_REPLICAS_ANNOTATION)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| fail(format!("gray deployment {} has no origin replica count", name)))?;

        let mut origin = k8s::get_deployment(&cluster, namespace, workload).await?;
        k8s::set_replicas(&mut origin, replicas);
        if let (Some(container), Some(image)) =
            (annotations.get(CONTAINER_ANNOTATION), annotations.get(ORIGIN_IMAGE_ANNOTATION))
        {
            if !image.is_empty() {
                k8s::set_image(&mut origin, container, image)?;
            }
        }
        k8s::apply(&cluster, namespace, &origin).await?;
        k8s::wait_ready(run, &cluster, namespace, workload).await?;

        for gray in &grays {
            let gray_name = gray.metadata.name.clone().unwrap_or_default();
            cluster.delete_deployment(namespace, &gray_name).await.map_err(fail)?;
        }
        tracing::info!(
            %namespace,
            deployment = %workload,
            replicas,
            removed = grays.len(),
            "gray release rolled back"
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "gray_tests.rs"]
mod tests;
