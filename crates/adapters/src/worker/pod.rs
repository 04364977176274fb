// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs jobs as Kubernetes pods.
//!
//! An init container copies the `cv` binary from the runner image into a
//! shared volume; the job's own image then runs `cv step-runner`, which
//! reads the context from [`CONTEXT_ENV`] and prints a report line at the
//! end of its log.

use super::{Worker, WorkerError, WorkerHandle, WorkerReport, WorkerState};
use crate::cluster::ClusterSet;
use crate::runner::RunReport;
use async_trait::async_trait;
use cv_core::spec::WorkerRuntime;
use cv_core::JobContext;
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, Pod, PodSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

pub const RUNNER_CONTAINER: &str = "runner";
pub const CONTEXT_ENV: &str = "CONVEYOR_JOB_CONTEXT";

const BIN_VOLUME: &str = "conveyor-bin";
const BIN_DIR: &str = "/conveyor/bin";
const WORKSPACE_VOLUME: &str = "workspace";
const WORKSPACE_DIR: &str = "/workspace";
const RUNNER_BINARY: &str = "/usr/local/bin/cv";

#[derive(Debug, Clone)]
struct PodRef {
    cluster_id: String,
    namespace: String,
    name: String,
}

pub struct PodWorker {
    clusters: ClusterSet,
    namespace: String,
    runner_image: String,
    pods: Mutex<HashMap<WorkerHandle, PodRef>>,
}

impl PodWorker {
    pub fn new(clusters: ClusterSet, namespace: impl Into<String>, runner_image: impl Into<String>) -> Self {
        Self {
            clusters,
            namespace: namespace.into(),
            runner_image: runner_image.into(),
            pods: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, handle: &WorkerHandle) -> Result<PodRef, WorkerError> {
        self.pods.lock().get(handle).cloned().ok_or_else(|| WorkerError::UnknownHandle(handle.to_string()))
    }
}

/// `cv-<workflow>-<task>-<hash>`, at most 63 characters.
pub fn pod_name(ctx: &JobContext) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}/{}/{}", ctx.workflow_name, ctx.task_id, ctx.job_key).as_bytes());
    let digest = hasher.finalize();
    let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();

    let workflow: String = ctx
        .workflow_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let suffix = format!("-{}-{}", ctx.task_id, hash);
    let room = 63usize.saturating_sub(3 + suffix.len());
    let workflow: String = workflow.chars().take(room).collect();
    format!("cv-{}{}", workflow.trim_matches('-'), suffix)
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

fn mount(name: &str, path: &str) -> VolumeMount {
    VolumeMount { name: name.to_string(), mount_path: path.to_string(), ..Default::default() }
}

fn empty_dir(name: &str) -> Volume {
    Volume { name: name.to_string(), empty_dir: Some(EmptyDirVolumeSource::default()), ..Default::default() }
}

pub(crate) fn build_pod(
    name: &str,
    ctx: &JobContext,
    image: &str,
    runner_image: &str,
) -> Result<Pod, WorkerError> {
    let context = serde_json::to_string(ctx)
        .map_err(|e| WorkerError::Start(format!("failed to encode job context: {}", e)))?;

    let labels = BTreeMap::from([
        ("app.kubernetes.io/managed-by".to_string(), "conveyor".to_string()),
        ("conveyor/task-id".to_string(), ctx.task_id.to_string()),
    ]);
    let annotations = BTreeMap::from([
        ("conveyor/workflow".to_string(), ctx.workflow_name.clone()),
        ("conveyor/job".to_string(), ctx.job_key.clone()),
    ]);

    let init = Container {
        name: "install-runner".to_string(),
        image: Some(runner_image.to_string()),
        command: Some(vec!["cp".to_string(), RUNNER_BINARY.to_string(), format!("{}/cv", BIN_DIR)]),
        volume_mounts: Some(vec![mount(BIN_VOLUME, BIN_DIR)]),
        ..Default::default()
    };

    let main = Container {
        name: RUNNER_CONTAINER.to_string(),
        image: Some(image.to_string()),
        command: Some(vec![
            format!("{}/cv", BIN_DIR),
            "step-runner".to_string(),
            "--root".to_string(),
            WORKSPACE_DIR.to_string(),
        ]),
        working_dir: Some(WORKSPACE_DIR.to_string()),
        env: Some(vec![env_var(CONTEXT_ENV, &context)]),
        volume_mounts: Some(vec![mount(BIN_VOLUME, BIN_DIR), mount(WORKSPACE_VOLUME, WORKSPACE_DIR)]),
        ..Default::default()
    };

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(PodSpec {
            init_containers: Some(vec![init]),
            containers: vec![main],
            volumes: Some(vec![empty_dir(BIN_VOLUME), empty_dir(WORKSPACE_VOLUME)]),
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[async_trait]
impl Worker for PodWorker {
    async fn start(
        &self,
        ctx: &JobContext,
        runtime: &WorkerRuntime,
    ) -> Result<WorkerHandle, WorkerError> {
        let cluster = self.clusters.get(&runtime.cluster_id)?;
        let image = if runtime.image.is_empty() { &self.runner_image } else { &runtime.image };
        let name = pod_name(ctx);
        let pod = build_pod(&name, ctx, image, &self.runner_image)?;
        cluster.create_pod(&self.namespace, &pod).await?;

        tracing::info!(pod = %name, namespace = %self.namespace, job_key = %ctx.job_key, "created job pod");
        let handle = WorkerHandle(name.clone());
        self.pods.lock().insert(
            handle.clone(),
            PodRef { cluster_id: runtime.cluster_id.clone(), namespace: self.namespace.clone(), name },
        );
        Ok(handle)
    }

    async fn poll(&self, handle: &WorkerHandle) -> Result<WorkerReport, WorkerError> {
        let pod_ref = self.lookup(handle)?;
        let cluster = self.clusters.get(&pod_ref.cluster_id)?;
        let pod = match cluster.get_pod(&pod_ref.namespace, &pod_ref.name).await {
            Ok(pod) => pod,
            Err(e) if e.is_not_found() => {
                return Ok(WorkerReport::failed(format!("pod {} disappeared", pod_ref.name)))
            }
            Err(e) => return Err(e.into()),
        };
        let phase = pod.status.and_then(|s| s.phase).unwrap_or_default();
        let state = match phase.as_str() {
            "Succeeded" => WorkerState::Succeeded,
            "Failed" => WorkerState::Failed,
            _ => return Ok(WorkerReport::running()),
        };

        let logs = cluster.pod_logs(&pod_ref.namespace, &pod_ref.name, RUNNER_CONTAINER).await?;
        let report = match RunReport::from_log(&logs) {
            Some(run) => WorkerReport { state, log: run.log, error: run.error, outputs: run.outputs },
            None => WorkerReport {
                state: WorkerState::Failed,
                error: format!("pod {} ended ({}) without a step report", pod_ref.name, phase),
                log: logs,
                outputs: BTreeMap::new(),
            },
        };
        Ok(report)
    }

    async fn cancel(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let pod_ref = self.lookup(handle)?;
        self.clusters.get(&pod_ref.cluster_id)?.delete_pod(&pod_ref.namespace, &pod_ref.name).await?;
        Ok(())
    }

    async fn cleanup(&self, handle: &WorkerHandle) -> Result<(), WorkerError> {
        let Some(pod_ref) = self.pods.lock().remove(handle) else {
            return Ok(());
        };
        self.clusters.get(&pod_ref.cluster_id)?.delete_pod(&pod_ref.namespace, &pod_ref.name).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
