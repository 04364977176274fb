// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cv-adapters: the engine's view of the outside world
//!
//! Every external system sits behind a trait with a real implementation
//! and, under `test-support`, an in-memory fake.

pub mod cluster;
pub mod helm;
pub mod integration;
pub mod notify;
pub mod output;
pub mod runner;
pub mod subprocess;
pub mod worker;

pub use cluster::{Cluster, ClusterError, ClusterSet, KubeCluster, Selector};
pub use helm::{Helm, HelmCli, HelmError};
pub use integration::{
    ApolloClient, HttpApolloClient, HttpNacosClient, IntegrationError, Integrations, IssueClient,
    JiraClient, MeegoClient, NacosClient,
};
pub use notify::{Notification, Notifier, NotifyError, WebhookNotifier};
pub use output::{MemoryOutputStore, OutputStore};
pub use runner::{RunDirs, RunOutcome, RunReport, StepRunner};
pub use worker::{
    AgentWorker, HttpAgentClient, LocalWorker, PodWorker, Worker, WorkerError, WorkerHandle,
    WorkerReport, WorkerState, Workers,
};

#[cfg(any(test, feature = "test-support"))]
pub use cluster::{ClusterCall, FakeCluster};
#[cfg(any(test, feature = "test-support"))]
pub use helm::FakeHelm;
#[cfg(any(test, feature = "test-support"))]
pub use integration::{FakeIntegrations, IntegrationCall};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifier, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use worker::{FakeAgentClient, FakeWorker, WorkerCall};
