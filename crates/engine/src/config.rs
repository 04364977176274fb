// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration (`cv.toml`).
//!
//! The file carries what the compiler and controllers need from the
//! installation: registries, environments, basic images, license features,
//! cluster contexts, worker selection and integration credentials. Values
//! from the environment (see [`crate::env`]) override the file.

use crate::env;
use cv_adapters::{
    AgentWorker, ClusterError, ClusterSet, HttpAgentClient, HttpApolloClient, HttpNacosClient,
    Integrations, IntegrationError, JiraClient, KubeCluster, LocalWorker, MeegoClient, PodWorker,
    WorkerError, Workers,
};
use cv_compiler::{CompileContext, Feature};
use cv_core::{Environment, Infrastructure, Registry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no state directory: set CV_STATE_DIR or HOME")]
    NoStateDir,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// A named image offered to jobs; the default one backs pod workers whose
/// job names no image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicImage {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub is_default: bool,
}

/// A cluster reachable through a kubeconfig context. An empty context uses
/// the in-cluster config or the current context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub id: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodWorkerConfig {
    #[serde(default)]
    pub cluster_id: String,
    pub namespace: String,
    #[serde(default)]
    pub runner_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub url: String,
    #[serde(default)]
    pub token: Secret,
}

/// Which worker serves each infrastructure kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Root of local job workspaces; `<state dir>/workspaces` when unset
    pub local_root: Option<PathBuf>,
    /// Root of `<tool>/<version>/bin` trees used by tool steps
    pub tools_dir: Option<PathBuf>,
    pub kubernetes: Option<PodWorkerConfig>,
    pub vm: Option<AgentConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraConfig {
    pub url: String,
    pub user: String,
    pub token: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeegoConfig {
    pub url: String,
    pub plugin_token: Secret,
    pub user_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NacosConfig {
    pub url: String,
    #[serde(default)]
    pub token: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApolloConfig {
    pub url: String,
    pub token: Secret,
    pub operator: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub jira: Option<JiraConfig>,
    pub meego: Option<MeegoConfig>,
    pub nacos: Option<NacosConfig>,
    pub apollo: Option<ApolloConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub state_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub default_job_timeout_secs: u64,
    pub approval_timeout_secs: u64,
    pub helm_binary: String,
    /// Send webhook notifications for `notify_ctls`
    pub notify: bool,
    pub registries: Vec<Registry>,
    pub environments: Vec<Environment>,
    pub basic_images: Vec<BasicImage>,
    pub features: Vec<Feature>,
    pub clusters: Vec<ClusterConfig>,
    pub workers: WorkerConfig,
    pub integrations: IntegrationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            poll_interval_ms: env::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            default_job_timeout_secs: env::DEFAULT_JOB_TIMEOUT_SECS,
            approval_timeout_secs: env::DEFAULT_APPROVAL_TIMEOUT_SECS,
            helm_binary: "helm".to_string(),
            notify: true,
            registries: Vec::new(),
            environments: Vec::new(),
            basic_images: Vec::new(),
            features: Vec::new(),
            clusters: Vec::new(),
            workers: WorkerConfig::default(),
            integrations: IntegrationConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` (or `CV_CONFIG`), falling back to defaults when neither
    /// names a file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(env::config_path);
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                Self::parse(&text)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Some(interval) = env::poll_interval() {
            self.poll_interval_ms = interval.as_millis() as u64;
        }
        if let Some(secs) = env::default_job_timeout_secs() {
            self.default_job_timeout_secs = secs;
        }
        if let Some(secs) = env::approval_timeout_secs() {
            self.approval_timeout_secs = secs;
        }
        if let (Some(image), Some(pod)) = (env::k8s_runner_image(), self.workers.kubernetes.as_mut()) {
            pod.runner_image = image;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".to_string()));
        }
        let mut ids = HashSet::new();
        for registry in &self.registries {
            if !ids.insert(registry.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate registry {}", registry.id)));
            }
        }
        let mut names = HashSet::new();
        for environment in &self.environments {
            if !names.insert(environment.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate environment {}", environment.name)));
            }
            if !self.clusters.is_empty() && !self.clusters.iter().any(|c| c.id == environment.cluster_id) {
                return Err(ConfigError::Invalid(format!(
                    "environment {} names unknown cluster {}",
                    environment.name, environment.cluster_id
                )));
            }
        }
        if self.basic_images.iter().filter(|i| i.is_default).count() > 1 {
            return Err(ConfigError::Invalid("more than one default basic image".to_string()));
        }
        if let Some(pod) = &self.workers.kubernetes {
            if pod.namespace.is_empty() {
                return Err(ConfigError::Invalid("workers.kubernetes.namespace is empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_secs)
    }

    /// The configured state dir, or the one resolved from the environment.
    pub fn state_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::state_dir(),
        }
    }

    pub fn default_image(&self) -> &str {
        self.basic_images
            .iter()
            .find(|i| i.is_default)
            .or_else(|| self.basic_images.first())
            .map(|i| i.image.as_str())
            .unwrap_or_default()
    }

    pub fn compile_context(&self, workflow_name: &str) -> CompileContext {
        CompileContext::new(workflow_name)
            .registries(self.registries.clone())
            .environments(self.environments.clone())
            .features(self.features.clone())
            .default_timeout_secs(self.default_job_timeout_secs)
            .default_image(self.default_image())
    }

    /// Connect every configured cluster. Nothing is contacted when no
    /// cluster is configured.
    pub async fn connect_clusters(&self) -> Result<ClusterSet, ConfigError> {
        let clusters = ClusterSet::new();
        for cluster in &self.clusters {
            let client = if cluster.context.is_empty() {
                KubeCluster::connect_default().await?
            } else {
                KubeCluster::connect_context(&cluster.context).await?
            };
            tracing::info!(id = %cluster.id, context = %cluster.context, "connected cluster");
            clusters.insert(cluster.id.clone(), Arc::new(client));
        }
        Ok(clusters)
    }

    /// Local jobs always run; pod and VM workers only when configured.
    pub fn build_workers(&self, clusters: &ClusterSet, state_dir: &Path) -> Result<Workers, ConfigError> {
        let root = self.workers.local_root.clone().unwrap_or_else(|| state_dir.join("workspaces"));
        let mut local = LocalWorker::new(root);
        if let Some(tools) = &self.workers.tools_dir {
            local = local.with_tools_dir(tools.clone());
        }
        let mut workers = Workers::new().with(Infrastructure::Local, Arc::new(local));

        if let Some(pod) = &self.workers.kubernetes {
            if pod.runner_image.is_empty() {
                return Err(ConfigError::Invalid(
                    "workers.kubernetes.runner_image is empty (or set CV_K8S_RUNNER_IMAGE)".to_string(),
                ));
            }
            let worker = PodWorker::new(clusters.clone(), pod.namespace.clone(), pod.runner_image.clone());
            workers = workers.with(Infrastructure::Kubernetes, Arc::new(worker));
        }
        if let Some(agent) = &self.workers.vm {
            let client = HttpAgentClient::new(agent.url.clone(), agent.token.expose())?;
            workers = workers.with(Infrastructure::Vm, Arc::new(AgentWorker::new(Arc::new(client))));
        }
        Ok(workers)
    }

    pub fn build_integrations(&self) -> Result<Integrations, ConfigError> {
        let cfg = &self.integrations;
        let mut integrations = Integrations::default();
        if let Some(jira) = &cfg.jira {
            integrations.jira = Some(Arc::new(JiraClient::new(&jira.url, &jira.user, jira.token.expose())?));
        }
        if let Some(meego) = &cfg.meego {
            integrations.meego =
                Some(Arc::new(MeegoClient::new(&meego.url, meego.plugin_token.expose(), &meego.user_key)?));
        }
        if let Some(nacos) = &cfg.nacos {
            integrations.nacos = Some(Arc::new(HttpNacosClient::new(&nacos.url, nacos.token.expose())?));
        }
        if let Some(apollo) = &cfg.apollo {
            integrations.apollo =
                Some(Arc::new(HttpApolloClient::new(&apollo.url, apollo.token.expose(), &apollo.operator)?));
        }
        Ok(integrations)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
