// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::DEFAULT_POLL_INTERVAL;
use cv_adapters::{ClusterSet, Helm, HelmCli, Integrations, MemoryOutputStore, OutputStore, Workers};
use cv_core::{Clock, Registry, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Capabilities shared read-only by every controller of every task.
#[derive(Clone)]
pub struct ControllerDeps {
    pub clusters: ClusterSet,
    pub workers: Workers,
    pub helm: Arc<dyn Helm>,
    pub integrations: Integrations,
    pub outputs: Arc<dyn OutputStore>,
    /// Registries freestyle jobs may log in to, by id
    pub registries: Vec<Registry>,
    pub clock: Arc<dyn Clock>,
    pub poll_interval: Duration,
}

impl ControllerDeps {
    pub fn new(clusters: ClusterSet, workers: Workers) -> Self {
        Self {
            clusters,
            workers,
            helm: Arc::new(HelmCli::new("helm")),
            integrations: Integrations::default(),
            outputs: Arc::new(MemoryOutputStore::new()),
            registries: Vec::new(),
            clock: Arc::new(SystemClock),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    cv_core::setters! {
        set {
            helm: Arc<dyn Helm>,
            integrations: Integrations,
            outputs: Arc<dyn OutputStore>,
            registries: Vec<Registry>,
            clock: Arc<dyn Clock>,
            poll_interval: Duration,
        }
    }

    pub fn registry(&self, id: &str) -> Option<&Registry> {
        if id.is_empty() {
            self.registries.iter().find(|r| r.is_default).or_else(|| self.registries.first())
        } else {
            self.registries.iter().find(|r| r.id == id)
        }
    }
}
