// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes wired into controller deps, plus k8s object fixtures.

use super::run_job;
use crate::deps::ControllerDeps;
use crate::state::TaskState;
use crate::test_helpers::RecordingAck;
use cv_adapters::cluster::labels;
use cv_adapters::{ClusterSet, FakeCluster, FakeHelm, FakeIntegrations, FakeWorker, MemoryOutputStore, Workers};
use cv_core::task::ClusterScope;
use cv_compiler::{compile_workflow, CompileContext};
use cv_core::{FakeClock, JobTask, JobTaskSpec, StageTask, TaskStatus, WorkflowDefinition, WorkflowTask};
use cv_storage::{MemoryTaskStore, TaskStore};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const NS: &str = "shop";
pub const CLUSTER: &str = "prod";
pub const WORKFLOW: &str = "shop-release";
pub const POLL: Duration = Duration::from_secs(1);

pub struct Harness {
    pub cluster: FakeCluster,
    pub worker: FakeWorker,
    pub helm: FakeHelm,
    pub integrations: FakeIntegrations,
    pub outputs: Arc<MemoryOutputStore>,
    pub store: Arc<MemoryTaskStore>,
    pub ack: Arc<RecordingAck>,
    pub deps: Arc<ControllerDeps>,
}

impl Harness {
    pub fn new() -> Self {
        let cluster = FakeCluster::new();
        let clusters = ClusterSet::new();
        clusters.insert(CLUSTER, Arc::new(cluster.clone()));
        let worker = FakeWorker::new();
        let helm = FakeHelm::new();
        let integrations = FakeIntegrations::new();
        let outputs = Arc::new(MemoryOutputStore::new());
        let deps = ControllerDeps::new(clusters, Workers::uniform(Arc::new(worker.clone())))
            .helm(Arc::new(helm.clone()))
            .integrations(integrations.integrations())
            .outputs(outputs.clone())
            .clock(Arc::new(FakeClock::default()))
            .poll_interval(POLL);
        Self {
            cluster,
            worker,
            helm,
            integrations,
            outputs,
            store: Arc::new(MemoryTaskStore::new()),
            ack: Arc::new(RecordingAck::default()),
            deps: Arc::new(deps),
        }
    }

    pub fn with_deps(mut self, f: impl FnOnce(ControllerDeps) -> ControllerDeps) -> Self {
        self.deps = Arc::new(f((*self.deps).clone()));
        self
    }

    /// A stored running task with one stage holding `jobs`. Task ids count
    /// up from 1 per harness.
    pub fn state(&self, jobs: Vec<JobTask>) -> Arc<TaskState> {
        let task = WorkflowTask {
            workflow_name: WORKFLOW.to_string(),
            task_id: self.store.next_task_id(WORKFLOW).unwrap(),
            status: TaskStatus::Running,
            stages: vec![StageTask {
                name: "release".to_string(),
                status: TaskStatus::Running,
                jobs,
                ..StageTask::default()
            }],
            ..WorkflowTask::default()
        };
        self.store.create_task(&task).unwrap();
        Arc::new(TaskState::new(task, self.store.clone(), self.ack.clone(), Arc::new(FakeClock::default())))
    }

    /// A stored, not yet started task compiled from `def`.
    pub fn compiled(&self, def: WorkflowDefinition) -> Arc<TaskState> {
        let task_id = self.store.next_task_id(&def.name).unwrap();
        let stages = compile_workflow(&def, &self.compile_context().task_id(task_id)).unwrap();
        let task = WorkflowTask {
            workflow_name: def.name.clone(),
            task_id,
            stages,
            origin_workflow_args: def,
            ..WorkflowTask::default()
        };
        self.store.create_task(&task).unwrap();
        Arc::new(TaskState::new(task, self.store.clone(), self.ack.clone(), Arc::new(FakeClock::default())))
    }

    pub fn compile_context(&self) -> CompileContext {
        CompileContext::new(WORKFLOW)
    }

    /// Run `job` alone to completion; returns its final record.
    pub async fn run(&self, job: JobTask) -> JobTask {
        let key = job.key.clone();
        let state = self.state(vec![job]);
        run_job(self.deps.clone(), state.clone(), key.clone(), CancellationToken::new()).await;
        state.job(&key).unwrap()
    }

    pub fn deployment(&self, name: &str) -> Deployment {
        self.cluster.deployment(NS, name).unwrap_or_else(|| panic!("deployment {} missing", name))
    }
}

pub fn scope() -> ClusterScope {
    ClusterScope { env: String::new(), cluster_id: CLUSTER.to_string(), namespace: NS.to_string() }
}

pub fn job(key: &str, spec: JobTaskSpec) -> JobTask {
    JobTask::builder().key(key).name(key).job_name(key).spec(spec).build()
}

/// A rolled-out deployment whose pods carry `app=<name>` and run `image`
/// in container `app`.
pub fn deployment(name: &str, replicas: i32, image: &str) -> Deployment {
    let pod_labels = labels(&[("app", name)]);
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NS.to_string()),
            generation: Some(1),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector { match_labels: Some(pod_labels.clone()), ..LabelSelector::default() },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(pod_labels), ..ObjectMeta::default() }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "app".to_string(),
                        image: Some(image.to_string()),
                        ..Container::default()
                    }],
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        status: Some(DeploymentStatus {
            observed_generation: Some(1),
            replicas: Some(replicas),
            ready_replicas: Some(replicas),
            updated_replicas: Some(replicas),
            available_replicas: Some(replicas),
            ..DeploymentStatus::default()
        }),
    }
}

pub fn service(name: &str, selector: &[(&str, &str)]) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NS.to_string()),
            ..ObjectMeta::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels(selector)),
            ports: Some(vec![ServicePort { port: 80, ..ServicePort::default() }]),
            cluster_ip: Some("10.0.0.12".to_string()),
            ..ServiceSpec::default()
        }),
        status: None,
    }
}

pub fn pod(name: &str, pod_labels: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NS.to_string()),
            labels: Some(labels(pod_labels)),
            ..ObjectMeta::default()
        },
        ..Pod::default()
    }
}

pub fn replicas_of(deployment: &Deployment) -> i32 {
    deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or_default()
}

pub fn image_of(deployment: &Deployment) -> String {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|s| s.containers.first())
        .and_then(|c| c.image.clone())
        .unwrap_or_default()
}

pub fn selector_of(service: &Service) -> std::collections::BTreeMap<String, String> {
    service.spec.as_ref().and_then(|s| s.selector.clone()).unwrap_or_default()
}
