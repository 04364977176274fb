// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value types shared between job definitions and job tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named variable, optionally a credential (never echoed to logs).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyVal {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_credential: bool,
}

impl KeyVal {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), is_credential: false }
    }

    pub fn secret(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into(), is_credential: true }
    }
}

/// Source control provider of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoSource {
    #[default]
    Github,
    Gitlab,
    Gitee,
    Gerrit,
    Other,
}

crate::simple_display! {
    RepoSource {
        Github => "github",
        Gitlab => "gitlab",
        Gitee => "gitee",
        Gerrit => "gerrit",
        Other => "other",
    }
}

/// A repository checkout target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Repo {
    #[serde(default)]
    pub source: RepoSource,
    pub owner: String,
    pub name: String,
    /// Clone address; derived from source/owner/name when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr: Option<u64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checkout_path: String,
}

/// Identity of a repository: two repos with equal identity are the same
/// checkout regardless of branch/tag/pr.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoIdentity {
    pub source: RepoSource,
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.source, self.owner, self.name)
    }
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into(), ..Default::default() }
    }

    pub fn identity(&self) -> RepoIdentity {
        RepoIdentity { source: self.source, owner: self.owner.clone(), name: self.name.clone() }
    }

    /// The revision this checkout resolves to: `pr-N`, then tag, then branch.
    pub fn reference(&self) -> String {
        if let Some(pr) = self.pr {
            format!("pr-{}", pr)
        } else if !self.tag.is_empty() {
            self.tag.clone()
        } else if !self.branch.is_empty() {
            self.branch.clone()
        } else {
            "HEAD".to_string()
        }
    }

    pub fn clone_address(&self) -> String {
        if !self.address.is_empty() {
            return self.address.clone();
        }
        let host = match self.source {
            RepoSource::Github => "github.com",
            RepoSource::Gitlab => "gitlab.com",
            RepoSource::Gitee => "gitee.com",
            RepoSource::Gerrit | RepoSource::Other => "localhost",
        };
        format!("https://{}/{}/{}.git", host, self.owner, self.name)
    }

    /// Directory (relative to the workspace) the repo is checked out into.
    pub fn checkout_dir(&self) -> &str {
        if self.checkout_path.is_empty() {
            &self.name
        } else {
            &self.checkout_path
        }
    }
}

/// A service and one of its modules (container / build target).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ServiceModule {
    pub service_name: String,
    pub service_module: String,
}

impl ServiceModule {
    pub fn new(service: impl Into<String>, module: impl Into<String>) -> Self {
        Self { service_name: service.into(), service_module: module.into() }
    }
}

impl fmt::Display for ServiceModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_name, self.service_module)
    }
}

/// A service/module produced by an upstream job, with whatever that job
/// knows about it (image, repos, variables).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceTarget {
    #[serde(flatten)]
    pub module: ServiceModule,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repos: Vec<Repo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_vals: Vec<KeyVal>,
}

/// Where a job task executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Infrastructure {
    /// In-cluster pod
    #[default]
    Kubernetes,
    /// Remote VM agent
    Vm,
    /// The engine's own host (development and single-node installs)
    Local,
}

crate::simple_display! {
    Infrastructure {
        Kubernetes => "kubernetes",
        Vm => "vm",
        Local => "local",
    }
}

/// An image registry the build steps may log in to.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Registry {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub is_default: bool,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Registry {
    /// Host part of the address without scheme.
    pub fn host(&self) -> &str {
        self.address
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }

    /// Full image reference prefix: `host/namespace`.
    pub fn prefix(&self) -> String {
        if self.namespace.is_empty() {
            self.host().to_string()
        } else {
            format!("{}/{}", self.host(), self.namespace)
        }
    }
}

/// A deploy environment: a namespace inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub cluster_id: String,
    pub namespace: String,
    #[serde(default)]
    pub production: bool,
}

/// Kubernetes resource type coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { group: group.into(), version: version.into(), kind: kind.into() }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// How a patch body is interpreted by the API server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchStrategy {
    #[default]
    Merge,
    StrategicMerge,
    Json,
}

crate::simple_display! {
    PatchStrategy {
        Merge => "merge",
        StrategicMerge => "strategic-merge",
        Json => "json",
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
