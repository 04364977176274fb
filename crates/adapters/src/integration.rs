// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tracker and config center capabilities.
//!
//! Each call handles a single item so controllers can attempt every item
//! independently and report the failures together.

use async_trait::async_trait;
use cv_core::spec::{ApolloNamespace, IssueTransition, NacosData};
use cv_core::task::IssueTracker;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrationError {
    #[error("{0} integration is not configured")]
    NotConfigured(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("rejected with {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("issue {issue} has no transition to {target}")]
    TransitionNotFound { issue: String, target: String },
}

#[async_trait]
pub trait IssueClient: Send + Sync + 'static {
    /// Move one issue (or work item) to `item.target`.
    async fn transition(&self, project_key: &str, item: &IssueTransition) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait NacosClient: Send + Sync + 'static {
    async fn publish(&self, namespace_id: &str, data: &NacosData) -> Result<(), IntegrationError>;
}

#[async_trait]
pub trait ApolloClient: Send + Sync + 'static {
    /// Write every key of the namespace and release it.
    async fn publish(&self, namespace: &ApolloNamespace) -> Result<(), IntegrationError>;
}

/// Configured integration clients; any may be absent.
#[derive(Clone, Default)]
pub struct Integrations {
    pub jira: Option<Arc<dyn IssueClient>>,
    pub meego: Option<Arc<dyn IssueClient>>,
    pub nacos: Option<Arc<dyn NacosClient>>,
    pub apollo: Option<Arc<dyn ApolloClient>>,
}

impl Integrations {
    pub fn issue_client(&self, tracker: IssueTracker) -> Result<Arc<dyn IssueClient>, IntegrationError> {
        let client = match tracker {
            IssueTracker::Jira => &self.jira,
            IssueTracker::Meego => &self.meego,
        };
        client.clone().ok_or_else(|| IntegrationError::NotConfigured(tracker.to_string()))
    }

    pub fn nacos(&self) -> Result<Arc<dyn NacosClient>, IntegrationError> {
        self.nacos.clone().ok_or_else(|| IntegrationError::NotConfigured("nacos".to_string()))
    }

    pub fn apollo(&self) -> Result<Arc<dyn ApolloClient>, IntegrationError> {
        self.apollo.clone().ok_or_else(|| IntegrationError::NotConfigured("apollo".to_string()))
    }
}

fn http_client() -> Result<reqwest::Client, IntegrationError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| IntegrationError::Request(format!("failed to build HTTP client: {}", e)))
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, IntegrationError> {
    let response = request.send().await.map_err(|e| IntegrationError::Request(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IntegrationError::Rejected { status: status.as_u16(), body: body.trim().to_string() });
    }
    Ok(response)
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Jira REST API v2; transitions are matched by name, case-insensitively.
pub struct JiraClient {
    base_url: String,
    user: String,
    token: String,
    http: reqwest::Client,
}

impl JiraClient {
    pub fn new(base_url: &str, user: &str, token: &str) -> Result<Self, IntegrationError> {
        Ok(Self {
            base_url: trim_base(base_url),
            user: user.to_string(),
            token: token.to_string(),
            http: http_client()?,
        })
    }
}

#[derive(Deserialize)]
struct JiraTransitions {
    transitions: Vec<JiraTransition>,
}

#[derive(Deserialize)]
struct JiraTransition {
    id: String,
    name: String,
}

#[async_trait]
impl IssueClient for JiraClient {
    async fn transition(&self, project_key: &str, item: &IssueTransition) -> Result<(), IntegrationError> {
        let url = format!("{}/rest/api/2/issue/{}/transitions", self.base_url, item.id);
        let response =
            send(self.http.get(&url).basic_auth(&self.user, Some(&self.token))).await?;
        let available: JiraTransitions =
            response.json().await.map_err(|e| IntegrationError::Request(e.to_string()))?;
        let transition = available
            .transitions
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&item.target))
            .ok_or_else(|| IntegrationError::TransitionNotFound {
                issue: item.id.clone(),
                target: item.target.clone(),
            })?;
        let body = serde_json::json!({ "transition": { "id": transition.id } });
        send(self.http.post(&url).basic_auth(&self.user, Some(&self.token)).json(&body)).await?;
        tracing::info!(project = %project_key, issue = %item.id, target = %item.target, "jira issue transitioned");
        Ok(())
    }
}

/// Meego open API, authenticated with a plugin token.
pub struct MeegoClient {
    base_url: String,
    plugin_token: String,
    user_key: String,
    http: reqwest::Client,
}

impl MeegoClient {
    pub fn new(base_url: &str, plugin_token: &str, user_key: &str) -> Result<Self, IntegrationError> {
        Ok(Self {
            base_url: trim_base(base_url),
            plugin_token: plugin_token.to_string(),
            user_key: user_key.to_string(),
            http: http_client()?,
        })
    }
}

#[async_trait]
impl IssueClient for MeegoClient {
    async fn transition(&self, project_key: &str, item: &IssueTransition) -> Result<(), IntegrationError> {
        let url = format!(
            "{}/open_api/{}/work_item/{}/state_change",
            self.base_url, project_key, item.id
        );
        let body = serde_json::json!({ "target_state": item.target });
        send(
            self.http
                .post(&url)
                .header("X-PLUGIN-TOKEN", &self.plugin_token)
                .header("X-USER-KEY", &self.user_key)
                .json(&body),
        )
        .await?;
        tracing::info!(project = %project_key, work_item = %item.id, target = %item.target, "meego work item transitioned");
        Ok(())
    }
}

/// Nacos v1 config API.
pub struct HttpNacosClient {
    base_url: String,
    access_token: String,
    http: reqwest::Client,
}

impl HttpNacosClient {
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, IntegrationError> {
        Ok(Self { base_url: trim_base(base_url), access_token: access_token.to_string(), http: http_client()? })
    }
}

#[async_trait]
impl NacosClient for HttpNacosClient {
    async fn publish(&self, namespace_id: &str, data: &NacosData) -> Result<(), IntegrationError> {
        let url = format!("{}/nacos/v1/cs/configs", self.base_url);
        let mut form = vec![
            ("dataId", data.data_id.as_str()),
            ("group", data.group.as_str()),
            ("content", data.content.as_str()),
            ("tenant", namespace_id),
        ];
        if !data.format.is_empty() {
            form.push(("type", data.format.as_str()));
        }
        let mut request = self.http.post(&url).form(&form);
        if !self.access_token.is_empty() {
            request = request.query(&[("accessToken", self.access_token.as_str())]);
        }
        send(request).await?;
        tracing::info!(namespace = %namespace_id, data_id = %data.data_id, group = %data.group, "nacos config published");
        Ok(())
    }
}

/// Apollo open API: upsert each item, then release the namespace.
pub struct HttpApolloClient {
    portal_url: String,
    token: String,
    operator: String,
    http: reqwest::Client,
}

impl HttpApolloClient {
    pub fn new(portal_url: &str, token: &str, operator: &str) -> Result<Self, IntegrationError> {
        Ok(Self {
            portal_url: trim_base(portal_url),
            token: token.to_string(),
            operator: operator.to_string(),
            http: http_client()?,
        })
    }
}

#[async_trait]
impl ApolloClient for HttpApolloClient {
    async fn publish(&self, ns: &ApolloNamespace) -> Result<(), IntegrationError> {
        let base = format!(
            "{}/openapi/v1/envs/{}/apps/{}/clusters/{}/namespaces/{}",
            self.portal_url, ns.env, ns.app_id, ns.cluster, ns.namespace
        );
        for kv in &ns.kvs {
            let body = serde_json::json!({
                "key": kv.key,
                "value": kv.value,
                "dataChangeCreatedBy": self.operator,
                "dataChangeLastModifiedBy": self.operator,
            });
            send(
                self.http
                    .put(format!("{}/items/{}", base, kv.key))
                    .query(&[("createIfNotExists", "true")])
                    .header("Authorization", &self.token)
                    .json(&body),
            )
            .await?;
        }
        let release = serde_json::json!({
            "releaseTitle": format!("conveyor-{}", ns.namespace),
            "releasedBy": self.operator,
        });
        send(self.http.post(format!("{}/releases", base)).header("Authorization", &self.token).json(&release))
            .await?;
        tracing::info!(app = %ns.app_id, env = %ns.env, namespace = %ns.namespace, keys = ns.kvs.len(), "apollo namespace released");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ApolloClient, IntegrationError, Integrations, IssueClient, NacosClient};
    use async_trait::async_trait;
    use cv_core::spec::{ApolloNamespace, IssueTransition, NacosData};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum IntegrationCall {
        Transition { project_key: String, id: String, target: String },
        Nacos { namespace_id: String, data_id: String },
        Apollo { app_id: String, namespace: String },
    }

    #[derive(Default)]
    struct FakeIntegrationsState {
        calls: Vec<IntegrationCall>,
        /// Issue ids, nacos data ids or apollo namespaces that fail
        failing: HashSet<String>,
    }

    /// Records every call; items named through [`FakeIntegrations::fail_item`] are rejected.
    #[derive(Clone, Default)]
    pub struct FakeIntegrations {
        inner: Arc<Mutex<FakeIntegrationsState>>,
    }

    impl FakeIntegrations {
        pub fn new() -> Self {
            Self::default()
        }

        /// All four clients backed by this fake.
        pub fn integrations(&self) -> Integrations {
            Integrations {
                jira: Some(Arc::new(self.clone())),
                meego: Some(Arc::new(self.clone())),
                nacos: Some(Arc::new(self.clone())),
                apollo: Some(Arc::new(self.clone())),
            }
        }

        pub fn fail_item(&self, id: &str) {
            self.inner.lock().failing.insert(id.to_string());
        }

        pub fn calls(&self) -> Vec<IntegrationCall> {
            self.inner.lock().calls.clone()
        }

        fn record(&self, call: IntegrationCall, item: &str) -> Result<(), IntegrationError> {
            let mut inner = self.inner.lock();
            inner.calls.push(call);
            if inner.failing.contains(item) {
                return Err(IntegrationError::Rejected { status: 400, body: format!("{} rejected", item) });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl IssueClient for FakeIntegrations {
        async fn transition(&self, project_key: &str, item: &IssueTransition) -> Result<(), IntegrationError> {
            self.record(
                IntegrationCall::Transition {
                    project_key: project_key.to_string(),
                    id: item.id.clone(),
                    target: item.target.clone(),
                },
                &item.id,
            )
        }
    }

    #[async_trait]
    impl NacosClient for FakeIntegrations {
        async fn publish(&self, namespace_id: &str, data: &NacosData) -> Result<(), IntegrationError> {
            self.record(
                IntegrationCall::Nacos { namespace_id: namespace_id.to_string(), data_id: data.data_id.clone() },
                &data.data_id,
            )
        }
    }

    #[async_trait]
    impl ApolloClient for FakeIntegrations {
        async fn publish(&self, ns: &ApolloNamespace) -> Result<(), IntegrationError> {
            self.record(
                IntegrationCall::Apollo { app_id: ns.app_id.clone(), namespace: ns.namespace.clone() },
                &ns.namespace,
            )
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeIntegrations, IntegrationCall};

#[cfg(test)]
#[path = "integration_tests.rs"]
mod tests;
