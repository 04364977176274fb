// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory cluster for tests.

use super::{selector_matches, Cluster, ClusterError, Selector};
use async_trait::async_trait;
use cv_core::{GroupVersionKind, PatchStrategy};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::api::core::v1::{Pod, PodStatus, Service};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A recorded mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    ApplyDeployment { namespace: String, name: String },
    ApplyService { namespace: String, name: String },
    PatchPod { namespace: String, name: String, patch: String },
    PatchUnstructured { namespace: String, kind: String, name: String, strategy: PatchStrategy },
    DeleteDeployment { namespace: String, name: String },
    DeleteService { namespace: String, name: String },
    CreatePod { namespace: String, name: String },
    DeletePod { namespace: String, name: String },
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

struct FakeClusterState {
    deployments: HashMap<Key, Deployment>,
    services: HashMap<Key, Service>,
    pods: HashMap<Key, Pod>,
    pod_logs: HashMap<Key, String>,
    /// Unstructured resources by (namespace, kind/name)
    resources: HashMap<Key, serde_json::Value>,
    calls: Vec<ClusterCall>,
    /// Errors returned by the named operation, consumed front to back
    failures: HashMap<&'static str, Vec<ClusterError>>,
    /// Applied deployments immediately report all replicas ready
    auto_ready: bool,
    /// Phase given to pods created through `create_pod`
    pod_phase: String,
}

/// Fake [`Cluster`] that keeps objects in memory and records calls.
#[derive(Clone)]
pub struct FakeCluster {
    inner: Arc<Mutex<FakeClusterState>>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClusterState {
                deployments: HashMap::new(),
                services: HashMap::new(),
                pods: HashMap::new(),
                pod_logs: HashMap::new(),
                resources: HashMap::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                auto_ready: true,
                pod_phase: "Pending".to_string(),
            })),
        }
    }
}

fn ready_status(deployment: &Deployment) -> DeploymentStatus {
    let replicas = deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    DeploymentStatus {
        observed_generation: deployment.metadata.generation,
        replicas: Some(replicas),
        ready_replicas: Some(replicas),
        updated_replicas: Some(replicas),
        available_replicas: Some(replicas),
        ..DeploymentStatus::default()
    }
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.inner.lock().calls.clone()
    }

    /// Queue an error for the next call of `op` (the trait method name).
    pub fn fail_next(&self, op: &'static str, err: ClusterError) {
        self.inner.lock().failures.entry(op).or_default().push(err);
    }

    pub fn set_auto_ready(&self, ready: bool) {
        self.inner.lock().auto_ready = ready;
    }

    /// Mark a stored deployment as fully rolled out.
    pub fn mark_ready(&self, namespace: &str, name: &str) {
        let mut inner = self.inner.lock();
        if let Some(d) = inner.deployments.get_mut(&key(namespace, name)) {
            d.status = Some(ready_status(d));
        }
    }

    pub fn set_pod_phase(&self, namespace: &str, name: &str, phase: &str) {
        let mut inner = self.inner.lock();
        if let Some(pod) = inner.pods.get_mut(&key(namespace, name)) {
            pod.status = Some(PodStatus { phase: Some(phase.to_string()), ..PodStatus::default() });
        }
    }

    pub fn set_created_pod_phase(&self, phase: &str) {
        self.inner.lock().pod_phase = phase.to_string();
    }

    pub fn set_pod_logs(&self, namespace: &str, name: &str, logs: &str) {
        self.inner.lock().pod_logs.insert(key(namespace, name), logs.to_string());
    }

    /// Seed a deployment as-is (status included).
    pub fn insert_deployment(&self, namespace: &str, deployment: Deployment) {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        self.inner.lock().deployments.insert(key(namespace, &name), deployment);
    }

    pub fn insert_service(&self, namespace: &str, service: Service) {
        let name = service.metadata.name.clone().unwrap_or_default();
        self.inner.lock().services.insert(key(namespace, &name), service);
    }

    pub fn insert_pod(&self, namespace: &str, pod: Pod) {
        let name = pod.metadata.name.clone().unwrap_or_default();
        self.inner.lock().pods.insert(key(namespace, &name), pod);
    }

    /// Seed an unstructured resource so patches against it succeed.
    pub fn insert_resource(&self, namespace: &str, kind: &str, name: &str) {
        self.inner
            .lock()
            .resources
            .insert(key(namespace, &format!("{}/{}", kind, name)), serde_json::json!({}));
    }

    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.inner.lock().deployments.get(&key(namespace, name)).cloned()
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.inner.lock().services.get(&key(namespace, name)).cloned()
    }

    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        self.inner.lock().pods.get(&key(namespace, name)).cloned()
    }

    pub fn resource(&self, namespace: &str, kind: &str, name: &str) -> Option<serde_json::Value> {
        self.inner.lock().resources.get(&key(namespace, &format!("{}/{}", kind, name))).cloned()
    }

    fn take_failure(&self, op: &'static str) -> Result<(), ClusterError> {
        let mut inner = self.inner.lock();
        match inner.failures.get_mut(op) {
            Some(queue) if !queue.is_empty() => Err(queue.remove(0)),
            _ => Ok(()),
        }
    }

    fn record(&self, call: ClusterCall) {
        self.inner.lock().calls.push(call);
    }
}

/// RFC 7386 merge of `patch` into `target`.
fn merge_json(target: &mut serde_json::Value, patch: &serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(t), serde_json::Value::Object(p)) => {
            for (k, v) in p {
                if v.is_null() {
                    t.remove(k);
                } else {
                    merge_json(t.entry(k.clone()).or_insert(serde_json::Value::Null), v);
                }
            }
        }
        (t, p) => *t = p.clone(),
    }
}

#[async_trait]
impl Cluster for FakeCluster {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        self.take_failure("get_deployment")?;
        self.deployment(namespace, name).ok_or_else(|| ClusterError::not_found("deployment", name))
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        self.take_failure("get_service")?;
        self.service(namespace, name).ok_or_else(|| ClusterError::not_found("service", name))
    }

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>, ClusterError> {
        self.take_failure("list_pods")?;
        let inner = self.inner.lock();
        let mut pods: Vec<Pod> = inner
            .pods
            .iter()
            .filter(|((ns, _), pod)| ns == namespace && selector_matches(selector, pod.metadata.labels.as_ref()))
            .map(|(_, pod)| pod.clone())
            .collect();
        pods.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(pods)
    }

    async fn list_deployments(&self, namespace: &str, selector: &Selector) -> Result<Vec<Deployment>, ClusterError> {
        self.take_failure("list_deployments")?;
        let inner = self.inner.lock();
        let mut deployments: Vec<Deployment> = inner
            .deployments
            .iter()
            .filter(|((ns, _), d)| ns == namespace && selector_matches(selector, d.metadata.labels.as_ref()))
            .map(|(_, d)| d.clone())
            .collect();
        deployments.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(deployments)
    }

    async fn create_or_patch_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), ClusterError> {
        self.take_failure("create_or_patch_deployment")?;
        let name = deployment.metadata.name.clone().unwrap_or_default();
        self.record(ClusterCall::ApplyDeployment { namespace: namespace.into(), name: name.clone() });
        let mut inner = self.inner.lock();
        let generation = inner
            .deployments
            .get(&key(namespace, &name))
            .and_then(|d| d.metadata.generation)
            .unwrap_or(0)
            + 1;
        let previous_status = inner.deployments.get(&key(namespace, &name)).and_then(|d| d.status.clone());
        let mut stored = deployment.clone();
        stored.metadata.generation = Some(generation);
        stored.status = if inner.auto_ready { Some(ready_status(&stored)) } else { previous_status };
        inner.deployments.insert(key(namespace, &name), stored);
        Ok(())
    }

    async fn create_or_patch_service(&self, namespace: &str, service: &Service) -> Result<(), ClusterError> {
        self.take_failure("create_or_patch_service")?;
        let name = service.metadata.name.clone().unwrap_or_default();
        self.record(ClusterCall::ApplyService { namespace: namespace.into(), name: name.clone() });
        self.inner.lock().services.insert(key(namespace, &name), service.clone());
        Ok(())
    }

    async fn patch_pod(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<(), ClusterError> {
        self.take_failure("patch_pod")?;
        self.record(ClusterCall::PatchPod {
            namespace: namespace.into(),
            name: name.into(),
            patch: patch.to_string(),
        });
        let mut inner = self.inner.lock();
        let pod = inner
            .pods
            .get_mut(&key(namespace, name))
            .ok_or_else(|| ClusterError::not_found("pod", name))?;
        let mut value = serde_json::to_value(&*pod).map_err(|e| ClusterError::Api(e.to_string()))?;
        merge_json(&mut value, patch);
        *pod = serde_json::from_value(value).map_err(|e| ClusterError::InvalidPatch(e.to_string()))?;
        Ok(())
    }

    async fn patch_unstructured(
        &self,
        namespace: &str,
        gvk: &GroupVersionKind,
        name: &str,
        strategy: PatchStrategy,
        patch: &str,
    ) -> Result<(), ClusterError> {
        self.take_failure("patch_unstructured")?;
        self.record(ClusterCall::PatchUnstructured {
            namespace: namespace.into(),
            kind: gvk.kind.clone(),
            name: name.into(),
            strategy,
        });
        let body: serde_json::Value = serde_json::from_str(patch)
            .map_err(|e| ClusterError::InvalidPatch(format!("{}: {}", name, e)))?;
        let shape_ok = match strategy {
            PatchStrategy::Json => body.is_array(),
            PatchStrategy::Merge | PatchStrategy::StrategicMerge => body.is_object(),
        };
        if !shape_ok {
            return Err(ClusterError::InvalidPatch(format!("{}: unexpected {} body", name, strategy)));
        }
        let mut inner = self.inner.lock();
        let resource = inner
            .resources
            .get_mut(&key(namespace, &format!("{}/{}", gvk.kind, name)))
            .ok_or_else(|| ClusterError::not_found("resource", name))?;
        if strategy != PatchStrategy::Json {
            merge_json(resource, &body);
        }
        Ok(())
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.take_failure("delete_deployment")?;
        self.record(ClusterCall::DeleteDeployment { namespace: namespace.into(), name: name.into() });
        self.inner.lock().deployments.remove(&key(namespace, name));
        Ok(())
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.take_failure("delete_service")?;
        self.record(ClusterCall::DeleteService { namespace: namespace.into(), name: name.into() });
        self.inner.lock().services.remove(&key(namespace, name));
        Ok(())
    }

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), ClusterError> {
        self.take_failure("create_pod")?;
        let name = pod.metadata.name.clone().unwrap_or_default();
        self.record(ClusterCall::CreatePod { namespace: namespace.into(), name: name.clone() });
        let mut inner = self.inner.lock();
        let mut stored = pod.clone();
        stored.status = Some(PodStatus { phase: Some(inner.pod_phase.clone()), ..PodStatus::default() });
        inner.pods.insert(key(namespace, &name), stored);
        Ok(())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError> {
        self.take_failure("get_pod")?;
        self.pod(namespace, name).ok_or_else(|| ClusterError::not_found("pod", name))
    }

    async fn pod_logs(&self, namespace: &str, name: &str, _container: &str) -> Result<String, ClusterError> {
        self.take_failure("pod_logs")?;
        let inner = self.inner.lock();
        if !inner.pods.contains_key(&key(namespace, name)) {
            return Err(ClusterError::not_found("pod", name));
        }
        Ok(inner.pod_logs.get(&key(namespace, name)).cloned().unwrap_or_default())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.take_failure("delete_pod")?;
        self.record(ClusterCall::DeletePod { namespace: namespace.into(), name: name.into() });
        self.inner.lock().pods.remove(&key(namespace, name));
        Ok(())
    }
}

/// Labels helper for seeding fixtures.
pub fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
