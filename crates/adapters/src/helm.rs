// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helm release capability.

use crate::subprocess::{run_with_timeout, HELM_TIMEOUT};
use async_trait::async_trait;
use cv_core::task::HelmTaskSpec;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelmError {
    #[error("helm upgrade of {release} failed: {message}")]
    Upgrade { release: String, message: String },
}

#[async_trait]
pub trait Helm: Send + Sync + 'static {
    /// `helm upgrade --install`, waiting for the release to be ready.
    async fn upgrade(&self, spec: &HelmTaskSpec) -> Result<(), HelmError>;
}

/// [`Helm`] through the `helm` binary. A non-empty cluster id selects the
/// kubeconfig context of the same name.
#[derive(Debug, Clone)]
pub struct HelmCli {
    binary: String,
    timeout: Duration,
}

impl Default for HelmCli {
    fn default() -> Self {
        Self { binary: "helm".to_string(), timeout: HELM_TIMEOUT }
    }
}

impl HelmCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into(), ..Self::default() }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn upgrade_args(spec: &HelmTaskSpec, timeout: Duration) -> Vec<String> {
    let mut args = vec![
        "upgrade".to_string(),
        "--install".to_string(),
        spec.release_name.clone(),
        spec.chart.clone(),
        "--namespace".to_string(),
        spec.scope.namespace.clone(),
    ];
    if !spec.chart_version.is_empty() {
        args.extend(["--version".to_string(), spec.chart_version.clone()]);
    }
    if !spec.scope.cluster_id.is_empty() {
        args.extend(["--kube-context".to_string(), spec.scope.cluster_id.clone()]);
    }
    for kv in &spec.values {
        args.extend(["--set".to_string(), format!("{}={}", kv.key, kv.value)]);
    }
    args.extend(["--wait".to_string(), "--timeout".to_string(), format!("{}s", timeout.as_secs())]);
    args
}

#[async_trait]
impl Helm for HelmCli {
    async fn upgrade(&self, spec: &HelmTaskSpec) -> Result<(), HelmError> {
        let fail = |message: String| HelmError::Upgrade { release: spec.release_name.clone(), message };
        let mut cmd = Command::new(&self.binary);
        cmd.args(upgrade_args(spec, self.timeout));
        // helm's own --timeout fires first; ours only catches a hung binary
        let output = run_with_timeout(cmd, self.timeout + Duration::from_secs(30), "helm upgrade")
            .await
            .map_err(fail)?;
        if !output.status.success() {
            return Err(fail(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        tracing::info!(
            release = %spec.release_name,
            chart = %spec.chart,
            namespace = %spec.scope.namespace,
            "helm release upgraded"
        );
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Helm, HelmError};
    use async_trait::async_trait;
    use cv_core::task::HelmTaskSpec;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeHelmState {
        upgrades: Vec<HelmTaskSpec>,
        failure: Option<String>,
    }

    /// Records upgrades; can be told to fail the next one.
    #[derive(Clone, Default)]
    pub struct FakeHelm {
        inner: Arc<Mutex<FakeHelmState>>,
    }

    impl FakeHelm {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn upgrades(&self) -> Vec<HelmTaskSpec> {
            self.inner.lock().upgrades.clone()
        }

        pub fn fail_next(&self, message: &str) {
            self.inner.lock().failure = Some(message.to_string());
        }
    }

    #[async_trait]
    impl Helm for FakeHelm {
        async fn upgrade(&self, spec: &HelmTaskSpec) -> Result<(), HelmError> {
            let mut inner = self.inner.lock();
            if let Some(message) = inner.failure.take() {
                return Err(HelmError::Upgrade { release: spec.release_name.clone(), message });
            }
            inner.upgrades.push(spec.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHelm;

#[cfg(test)]
#[path = "helm_tests.rs"]
mod tests;
