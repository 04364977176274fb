// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Cluster, ClusterError, Selector};
use async_trait::async_trait;
use cv_core::{GroupVersionKind, PatchStrategy};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{
    Api, ApiResource, DeleteParams, DynamicObject, ListParams, LogParams, Patch, PatchParams,
    PostParams,
};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

const FIELD_MANAGER: &str = "conveyor";

/// [`Cluster`] backed by a Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// In-cluster config or the current kubeconfig context.
    pub async fn connect_default() -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Connect(format!("failed to create kube client: {}", e)))?;
        Ok(Self::new(client))
    }

    /// A named context of the local kubeconfig.
    pub async fn connect_context(context: &str) -> Result<Self, ClusterError> {
        let kubeconfig = Kubeconfig::read().map_err(|e| ClusterError::Connect(e.to_string()))?;
        let options = KubeConfigOptions { context: Some(context.to_string()), ..Default::default() };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| ClusterError::Connect(format!("context {}: {}", context, e)))?;
        let client = Client::try_from(config).map_err(|e| ClusterError::Connect(e.to_string()))?;
        Ok(Self::new(client))
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn api_error(kind: &'static str, name: &str, err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => ClusterError::not_found(kind, name),
        other => ClusterError::Api(format!("{} {}: {}", kind, name, other)),
    }
}

/// Deletes of already-absent objects succeed.
fn ignore_not_found(result: Result<(), ClusterError>) -> Result<(), ClusterError> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

fn object_name(meta: &ObjectMeta) -> Result<&str, ClusterError> {
    meta.name.as_deref().ok_or_else(|| ClusterError::Api("object has no name".to_string()))
}

/// Server-side apply rejects objects carrying server-owned metadata, which
/// read-modify-write callers pass back verbatim.
fn clear_server_fields(meta: &mut ObjectMeta) {
    meta.managed_fields = None;
    meta.resource_version = None;
    meta.uid = None;
    meta.creation_timestamp = None;
    meta.generation = None;
}

fn label_selector(selector: &Selector) -> String {
    selector.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        self.deployments(namespace).get(name).await.map_err(|e| api_error("deployment", name, e))
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ClusterError> {
        self.services(namespace).get(name).await.map_err(|e| api_error("service", name, e))
    }

    async fn list_pods(&self, namespace: &str, selector: &Selector) -> Result<Vec<Pod>, ClusterError> {
        let params = ListParams::default().labels(&label_selector(selector));
        let list = self
            .pods(namespace)
            .list(&params)
            .await
            .map_err(|e| api_error("pod", &label_selector(selector), e))?;
        Ok(list.items)
    }

    async fn list_deployments(&self, namespace: &str, selector: &Selector) -> Result<Vec<Deployment>, ClusterError> {
        let params = ListParams::default().labels(&label_selector(selector));
        let list = self
            .deployments(namespace)
            .list(&params)
            .await
            .map_err(|e| api_error("deployment", &label_selector(selector), e))?;
        Ok(list.items)
    }

    async fn create_or_patch_deployment(
        &self,
        namespace: &str,
        deployment: &Deployment,
    ) -> Result<(), ClusterError> {
        let name = object_name(&deployment.metadata)?;
        let mut deployment = deployment.clone();
        clear_server_fields(&mut deployment.metadata);
        deployment.status = None;
        let params = PatchParams::apply(FIELD_MANAGER).force();
        self.deployments(namespace)
            .patch(name, &params, &Patch::Apply(&deployment))
            .await
            .map_err(|e| api_error("deployment", name, e))?;
        tracing::debug!(%namespace, %name, "applied deployment");
        Ok(())
    }

    async fn create_or_patch_service(&self, namespace: &str, service: &Service) -> Result<(), ClusterError> {
        let name = object_name(&service.metadata)?;
        let mut service = service.clone();
        clear_server_fields(&mut service.metadata);
        service.status = None;
        let params = PatchParams::apply(FIELD_MANAGER).force();
        self.services(namespace)
            .patch(name, &params, &Patch::Apply(&service))
            .await
            .map_err(|e| api_error("service", name, e))?;
        tracing::debug!(%namespace, %name, "applied service");
        Ok(())
    }

    async fn patch_pod(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<(), ClusterError> {
        self.pods(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| api_error("pod", name, e))?;
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
        let resource = ApiResource::from_gvk(&kube::core::GroupVersionKind::gvk(
            &gvk.group,
            &gvk.version,
            &gvk.kind,
        ));
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &resource);
        let params = PatchParams::default();
        let invalid = |e: serde_json::Error| ClusterError::InvalidPatch(format!("{}: {}", name, e));
        let result = match strategy {
            PatchStrategy::Merge => {
                let body: serde_json::Value = serde_json::from_str(patch).map_err(invalid)?;
                api.patch(name, &params, &Patch::Merge(body)).await
            }
            PatchStrategy::StrategicMerge => {
                let body: serde_json::Value = serde_json::from_str(patch).map_err(invalid)?;
                api.patch(name, &params, &Patch::Strategic(body)).await
            }
            PatchStrategy::Json => {
                let body: json_patch::Patch = serde_json::from_str(patch).map_err(invalid)?;
                api.patch(name, &params, &Patch::<()>::Json(body)).await
            }
        };
        result.map_err(|e| api_error("resource", name, e))?;
        tracing::info!(%namespace, %name, kind = %gvk, %strategy, "patched resource");
        Ok(())
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        ignore_not_found(
            self.deployments(namespace)
                .delete(name, &DeleteParams::background())
                .await
                .map(|_| ())
                .map_err(|e| api_error("deployment", name, e)),
        )
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        ignore_not_found(
            self.services(namespace)
                .delete(name, &DeleteParams::default())
                .await
                .map(|_| ())
                .map_err(|e| api_error("service", name, e)),
        )
    }

    async fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), ClusterError> {
        let name = object_name(&pod.metadata)?;
        self.pods(namespace)
            .create(&PostParams::default(), pod)
            .await
            .map_err(|e| api_error("pod", name, e))?;
        Ok(())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Pod, ClusterError> {
        self.pods(namespace).get(name).await.map_err(|e| api_error("pod", name, e))
    }

    async fn pod_logs(&self, namespace: &str, name: &str, container: &str) -> Result<String, ClusterError> {
        let params = LogParams { container: Some(container.to_string()), ..LogParams::default() };
        self.pods(namespace).logs(name, &params).await.map_err(|e| api_error("pod", name, e))
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        ignore_not_found(
            self.pods(namespace)
                .delete(name, &DeleteParams::default())
                .await
                .map(|_| ())
                .map_err(|e| api_error("pod", name, e)),
        )
    }
}
