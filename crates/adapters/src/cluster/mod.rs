// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes cluster capability.
//!
//! Controllers only see the [`Cluster`] trait. [`KubeCluster`] talks to a
//! real API server through `kube`; [`FakeCluster`] keeps objects in memory.

mod client;

pub use client::KubeCluster;

use async_trait::async_trait;
use cv_core::{GroupVersionKind, PatchStrategy};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },
    #[error("unknown cluster: {0}")]
    UnknownCluster(String),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("cluster connection failed: {0}")]
    Connect(String),
    #[error("kubernetes API error: {0}")]
    Api(String),
}

impl ClusterError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        ClusterError::NotFound { kind, name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}

/// Label selector as an exact-match map.
pub type Selector = BTreeMap<String, String>;

#[async_trait]
pub trait Cluster: Send + Sync + 'static {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError>;

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError>;

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>, ClusterError>;

    async fn list_deployments(&self, namespace: &str, selector: &Selector) -> Result<Vec<Deployment>, ClusterError>;

    async fn create_or_patch_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), ClusterError>;

    async fn create_or_patch_service(&self, namespace: &str, service: &Service) -> Result<(), ClusterError>;

    /// Merge-patch a pod (labels and annotations).
    async fn patch_pod(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<(), ClusterError>;

    /// Patch an arbitrary namespaced resource.
    async fn patch_unstructured(
        &self,
        namespace: &str,
        gvk: &GroupVersionKind,
        name: &str,
        strategy: PatchStrategy,
        patch: &str,
    ) -> Result<(), ClusterError>;

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), ClusterError>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError>;

    async fn pod_logs(&self, namespace: &str, name: &str, container: &str) -> Result<String, ClusterError>;

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
}

/// Clusters by id. The empty id names the engine's own cluster.
#[derive(Clone, Default)]
pub struct ClusterSet {
    clusters: Arc<Mutex<HashMap<String, Arc<dyn Cluster>>>>,
}

impl ClusterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, cluster: Arc<dyn Cluster>) {
        self.clusters.lock().insert(id.into(), cluster);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Cluster>, ClusterError> {
        self.clusters
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| ClusterError::UnknownCluster(id.to_string()))
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clusters.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Whether every label of `selector` is present with the same value.
pub fn selector_matches(selector: &Selector, labels: Option<&BTreeMap<String, String>>) -> bool {
    selector.iter().all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{labels, ClusterCall, FakeCluster};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
