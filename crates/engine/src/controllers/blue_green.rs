// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blue-green deploy and release.
//!
//! Deploy walks `Init → (SeedOriginLabels) → CreateBlueService →
//! CreateBlueDeployment → WaitBlueReady` per target. The live ("green")
//! resources are never deleted; release repoints the live service at the
//! blue version and drops the temporary blue service.

use super::{fail, k8s, JobRun, StepResult};
use cv_adapters::Cluster;
use cv_core::spec::RolloutTarget;
use cv_core::task::BlueGreenTaskSpec;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Label selecting one side of a blue-green pair.
pub const VERSION_LABEL: &str = "conveyor-blue-green-version";
/// Version label value of resources that predate the first deploy.
pub const ORIGIN_VERSION: &str = "origin";

fn service_selector(service: &Service) -> BTreeMap<String, String> {
    service.spec.as_ref().and_then(|s| s.selector.clone()).unwrap_or_default()
}

fn set_service_version(service: &mut Service, version: &str) {
    service
        .spec
        .get_or_insert_with(ServiceSpec::default)
        .selector
        .get_or_insert_with(BTreeMap::new)
        .insert(VERSION_LABEL.to_string(), version.to_string());
}

/// The temporary service fronting the blue pods only.
fn blue_service(live: &Service, name: &str, version: &str) -> Service {
    let mut selector = service_selector(live);
    selector.insert(VERSION_LABEL.to_string(), version.to_string());
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: live.metadata.namespace.clone(),
            labels: live.metadata.labels.clone(),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: live.spec.as_ref().and_then(|s| s.ports.clone()),
            ..ServiceSpec::default()
        }),
        status: None,
    }
}

/// Label every pod behind the live service, the live deployment template
/// and the live service selector with the origin version.
async fn seed_origin_labels(
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    mut service: Service,
    origin: &mut Deployment,
) -> StepResult {
    let service_name = service.metadata.name.clone().unwrap_or_default();
    let mut selector = service_selector(&service);
    selector.remove(VERSION_LABEL);
    if selector.is_empty() {
        return Err(fail(format!("service {} has no selector", service_name)));
    }
    let pods = cluster.list_pods(namespace, &selector).await.map_err(fail)?;
    let patch = serde_json::json!({ "metadata": { "labels": { VERSION_LABEL: ORIGIN_VERSION } } });
    for pod in &pods {
        if let Some(name) = &pod.metadata.name {
            cluster.patch_pod(namespace, name, &patch).await.map_err(fail)?;
        }
    }

    k8s::template_labels_mut(origin).insert(VERSION_LABEL.to_string(), ORIGIN_VERSION.to_string());
    k8s::apply(cluster, namespace, origin).await?;

    set_service_version(&mut service, ORIGIN_VERSION);
    cluster.create_or_patch_service(namespace, &service).await.map_err(fail)?;
    tracing::info!(%namespace, service = %service_name, pods = pods.len(), "seeded origin version labels");
    Ok(())
}

async fn deploy_target(
    run: &JobRun,
    cluster: &Arc<dyn Cluster>,
    spec: &BlueGreenTaskSpec,
    target: &RolloutTarget,
) -> StepResult {
    let namespace = spec.scope.namespace.as_str();
    let service = cluster.get_service(namespace, &target.k8s_service_name).await.map_err(fail)?;
    let mut origin = k8s::get_deployment(cluster, namespace, &target.workload_name).await?;

    // Either side missing the version label means the pair was never seeded
    if !service_selector(&service).contains_key(VERSION_LABEL)
        || !k8s::template_labels(&origin).contains_key(VERSION_LABEL)
    {
        seed_origin_labels(cluster, namespace, service.clone(), &mut origin).await?;
    }
    run.checkpoint()?;

    let blue_service_name = spec.blue_name(&target.k8s_service_name);
    cluster
        .create_or_patch_service(namespace, &blue_service(&service, &blue_service_name, &spec.version))
        .await
        .map_err(fail)?;

    let blue_name = spec.blue_name(&target.workload_name);
    let mut blue = k8s::copy_as(&origin, &blue_name);
    k8s::add_selector_label(&mut blue, VERSION_LABEL, &spec.version);
    k8s::set_image(&mut blue, &target.container_name, &target.image)?;
    k8s::apply(cluster, namespace, &blue).await?;
    tracing::info!(%namespace, deployment = %blue_name, version = %spec.version, "created blue deployment");

    k8s::wait_ready(run, cluster, namespace, &blue_name).await
}

pub(super) async fn deploy(run: &JobRun, spec: &BlueGreenTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    for target in &spec.targets {
        run.checkpoint()?;
        deploy_target(run, &cluster, spec, target).await?;
    }
    Ok(())
}

pub(super) async fn release(run: &JobRun, spec: &BlueGreenTaskSpec) -> StepResult {
    let cluster = run.cluster(&spec.scope.cluster_id)?;
    let namespace = spec.scope.namespace.as_str();
    for target in &spec.targets {
        run.checkpoint()?;
        let mut service = cluster.get_service(namespace, &target.k8s_service_name).await.map_err(fail)?;
        set_service_version(&mut service, &spec.version);
        cluster.create_or_patch_service(namespace, &service).await.map_err(fail)?;
        cluster
            .delete_service(namespace, &spec.blue_name(&target.k8s_service_name))
            .await
            .map_err(fail)?;
        tracing::info!(%namespace, service = %target.k8s_service_name, version = %spec.version, "released blue version");
    }
    Ok(())
}

/// Remove the blue side of a failed deploy.
pub(super) async fn clean(run: &JobRun, spec: &BlueGreenTaskSpec) -> Result<(), String> {
    let cluster = run.deps.clusters.get(&spec.scope.cluster_id).map_err(|e| e.to_string())?;
    let namespace = spec.scope.namespace.as_str();
    let mut errors = Vec::new();
    for target in &spec.targets {
        if let Err(e) = cluster.delete_deployment(namespace, &spec.blue_name(&target.workload_name)).await {
            errors.push(e.to_string());
        }
        if let Err(e) = cluster.delete_service(namespace, &spec.blue_name(&target.k8s_service_name)).await {
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
#[path = "blue_green_tests.rs"]
mod tests;
