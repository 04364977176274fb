// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow status notifications.

use async_trait::async_trait;
use cv_core::{NotifyCtl, TaskStatus};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from notify operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("notify target has no address")]
    NoAddress,
}

/// A workflow task reached a status someone asked to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub workflow_name: String,
    pub task_id: i64,
    pub status: TaskStatus,
    pub creator: String,
    /// Failed job keys with their errors
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<(String, String)>,
}

impl Notification {
    pub fn title(&self) -> String {
        format!("{} #{} {}", self.workflow_name, self.task_id, self.status)
    }

    pub fn text(&self) -> String {
        let mut text = self.title();
        if !self.creator.is_empty() {
            text.push_str(&format!("\ntriggered by {}", self.creator));
        }
        for (job, error) in &self.failures {
            text.push_str(&format!("\n- {}: {}", job, error));
        }
        text
    }
}

/// Adapter for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, ctl: &NotifyCtl, notification: &Notification) -> Result<(), NotifyError>;
}

/// Posts to chat webhooks. `webhook_type` picks the body shape: `feishu`,
/// `dingding`, `wechat`, or anything else for the raw notification JSON.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
        Ok(Self { http })
    }
}

pub fn webhook_body(webhook_type: &str, notification: &Notification) -> serde_json::Value {
    let text = notification.text();
    match webhook_type {
        "feishu" | "lark" => serde_json::json!({ "msg_type": "text", "content": { "text": text } }),
        "dingding" | "wechat" => serde_json::json!({ "msgtype": "text", "text": { "content": text } }),
        _ => serde_json::json!(notification),
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, ctl: &NotifyCtl, notification: &Notification) -> Result<(), NotifyError> {
        if ctl.address.is_empty() {
            return Err(NotifyError::NoAddress);
        }
        let body = webhook_body(&ctl.webhook_type, notification);
        let response = self
            .http
            .post(&ctl.address)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::SendFailed(format!("{} returned {}", ctl.webhook_type, response.status())));
        }
        tracing::info!(title = %notification.title(), webhook = %ctl.webhook_type, "notification sent");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Notification, Notifier, NotifyError};
    use async_trait::async_trait;
    use cv_core::NotifyCtl;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded notification
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct NotifyCall {
        pub webhook_type: String,
        pub notification: Notification,
    }

    /// Fake notifier for testing
    #[derive(Clone, Default)]
    pub struct FakeNotifier {
        calls: Arc<Mutex<Vec<NotifyCall>>>,
    }

    impl FakeNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<NotifyCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, ctl: &NotifyCtl, notification: &Notification) -> Result<(), NotifyError> {
            self.calls.lock().push(NotifyCall {
                webhook_type: ctl.webhook_type.clone(),
                notification: notification.clone(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, NotifyCall};

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
