// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment helpers shared by the rollout controllers.

use super::{fail, settled, JobRun, StepResult};
use crate::poll::Observation;
use cv_adapters::{Cluster, ClusterError};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `ceil(baseline × percent / 100)`.
pub fn scaled_replicas(baseline: i32, percent: u32) -> i32 {
    let scaled = (i64::from(baseline.max(0)) * i64::from(percent) + 99) / 100;
    scaled.min(i64::from(i32::MAX)) as i32
}

pub(super) fn replicas(deployment: &Deployment) -> i32 {
    deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1)
}

pub(super) fn set_replicas(deployment: &mut Deployment, replicas: i32) {
    deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
}

fn containers_mut(deployment: &mut Deployment) -> Option<&mut Vec<Container>> {
    deployment.spec.as_mut()?.template.spec.as_mut().map(|s| &mut s.containers)
}

pub(super) fn container_image(deployment: &Deployment, container: &str) -> Option<String> {
    deployment
        .spec
        .as_ref()?
        .template
        .spec
        .as_ref()?
        .containers
        .iter()
        .find(|c| c.name == container)
        .and_then(|c| c.image.clone())
}

pub(super) fn set_image(deployment: &mut Deployment, container: &str, image: &str) -> StepResult {
    let name = deployment.metadata.name.clone().unwrap_or_default();
    let target = containers_mut(deployment)
        .and_then(|cs| cs.iter_mut().find(|c| c.name == container))
        .ok_or_else(|| fail(format!("container {} not found in deployment {}", container, name)))?;
    target.image = Some(image.to_string());
    Ok(())
}

pub(super) fn selector_labels(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.selector.match_labels.clone())
        .unwrap_or_default()
}

pub(super) fn template_labels(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.labels.clone())
        .unwrap_or_default()
}

pub(super) fn template_labels_mut(deployment: &mut Deployment) -> &mut BTreeMap<String, String> {
    let spec = deployment.spec.get_or_insert_with(Default::default);
    spec.template.metadata.get_or_insert_with(Default::default).labels.get_or_insert_with(BTreeMap::new)
}

/// Add a label to both the selector and the pod template.
pub(super) fn add_selector_label(deployment: &mut Deployment, key: &str, value: &str) {
    let spec = deployment.spec.get_or_insert_with(Default::default);
    spec.selector
        .match_labels
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value.to_string());
    template_labels_mut(deployment).insert(key.to_string(), value.to_string());
}

pub(super) fn annotations(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment.metadata.annotations.clone().unwrap_or_default()
}

/// A new deployment named `name` running `origin`'s pod spec.
pub(super) fn copy_as(origin: &Deployment, name: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: origin.metadata.namespace.clone(),
            labels: origin.metadata.labels.clone(),
            ..ObjectMeta::default()
        },
        spec: origin.spec.clone(),
        status: None,
    }
}

/// Fully rolled out: the latest generation is observed and every replica is
/// updated, ready and available.
pub(super) fn is_ready(deployment: &Deployment) -> bool {
    let Some(status) = &deployment.status else {
        return false;
    };
    if let (Some(generation), Some(observed)) = (deployment.metadata.generation, status.observed_generation) {
        if observed < generation {
            return false;
        }
    }
    let want = replicas(deployment);
    status.updated_replicas.unwrap_or(0) >= want
        && status.ready_replicas.unwrap_or(0) >= want
        && status.available_replicas.unwrap_or(0) >= want
        && status.replicas.unwrap_or(0) <= status.updated_replicas.unwrap_or(0)
}

pub(super) async fn get_deployment(
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    name: &str,
) -> StepResult<Deployment> {
    cluster.get_deployment(namespace, name).await.map_err(fail)
}

pub(super) async fn apply(cluster: &Arc<dyn Cluster>, namespace: &str, deployment: &Deployment) -> StepResult {
    cluster.create_or_patch_deployment(namespace, deployment).await.map_err(fail)
}

/// Poll until the deployment is fully rolled out.
pub(super) async fn wait_ready(
    run: &JobRun,
    cluster: &Arc<dyn Cluster>,
    namespace: &str,
    name: &str,
) -> StepResult {
    let outcome = run
        .poll(|| async move {
            match cluster.get_deployment(namespace, name).await {
                Ok(d) if is_ready(&d) => Observation::Ready(()),
                Ok(_) => Observation::Pending,
                Err(e @ ClusterError::UnknownCluster(_)) => Observation::Failed(e.to_string()),
                Err(e) => {
                    tracing::debug!(%namespace, deployment = %name, error = %e, "deployment not ready");
                    Observation::Pending
                }
            }
        })
        .await;
    settled(outcome)?;
    tracing::info!(%namespace, deployment = %name, "deployment ready");
    Ok(())
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod tests;
