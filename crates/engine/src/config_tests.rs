// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

const FULL: &str = r#"
poll_interval_ms = 500
default_job_timeout_secs = 1200
features = ["vm-infrastructure", "nacos"]

[[registries]]
id = "hub"
address = "https://registry.example.com"
namespace = "acme"
access_key = "robot"
secret_key = "s3cret"
is_default = true

[[environments]]
name = "staging"
cluster_id = "c1"
namespace = "shop-staging"

[[basic_images]]
id = "ubuntu"
image = "ubuntu:22.04"

[[basic_images]]
id = "builder"
image = "builder:3"
is_default = true

[[clusters]]
id = "c1"
context = "staging-admin"

[workers.kubernetes]
cluster_id = "c1"
namespace = "cv-jobs"
runner_image = "conveyor/runner:1"

[workers.vm]
url = "https://agents.example.com"
token = "agent-token"

[integrations.jira]
url = "https://jira.example.com"
user = "bot"
token = "jira-token"
"#;

#[test]
fn parses_a_full_file() {
    let config = EngineConfig::parse(FULL).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_millis(500));
    assert_eq!(config.default_job_timeout_secs, 1200);
    assert_eq!(config.approval_timeout_secs, env::DEFAULT_APPROVAL_TIMEOUT_SECS);
    assert_eq!(config.features, vec![Feature::VmInfrastructure, Feature::Nacos]);
    assert_eq!(config.registries[0].secret_key, "s3cret");
    assert_eq!(config.default_image(), "builder:3");
    assert_eq!(config.workers.vm.as_ref().unwrap().token.expose(), "agent-token");
}

#[test]
fn empty_file_gives_defaults() {
    let config = EngineConfig::parse("").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.poll_interval(), env::DEFAULT_POLL_INTERVAL);
    assert_eq!(config.default_image(), "");
}

#[test]
fn secrets_stay_out_of_debug_output() {
    let config = EngineConfig::parse(FULL).unwrap();
    let debug = format!("{:?}", config);
    assert!(!debug.contains("s3cret"));
    assert!(!debug.contains("agent-token"));
    assert!(!debug.contains("jira-token"));
}

#[test]
fn compile_context_carries_installation_values() {
    let config = EngineConfig::parse(FULL).unwrap();
    let ctx = config.compile_context("shop");
    assert_eq!(ctx.workflow_name, "shop");
    assert_eq!(ctx.default_timeout_secs, 1200);
    assert_eq!(ctx.default_image, "builder:3");
    assert!(ctx.has(Feature::Nacos));
    assert!(!ctx.has(Feature::Apollo));
    assert_eq!(ctx.environment("staging").map(|e| e.cluster_id.as_str()), Some("c1"));
    assert_eq!(ctx.default_registry().map(|r| r.id.as_str()), Some("hub"));
}

#[yare::parameterized(
    unknown_field = { "colour = \"blue\"" },
    zero_poll = { "poll_interval_ms = 0" },
    duplicate_registry = { "[[registries]]\nid = \"a\"\naddress = \"x\"\n[[registries]]\nid = \"a\"\naddress = \"y\"" },
    env_on_unknown_cluster = { "[[clusters]]\nid = \"c1\"\n[[environments]]\nname = \"dev\"\ncluster_id = \"c2\"\nnamespace = \"dev\"" },
    two_default_images = { "[[basic_images]]\nid = \"a\"\nimage = \"a\"\nis_default = true\n[[basic_images]]\nid = \"b\"\nimage = \"b\"\nis_default = true" },
    pod_worker_without_namespace = { "[workers.kubernetes]\nnamespace = \"\"" },
)]
fn rejects_invalid_files(text: &str) {
    assert!(EngineConfig::parse(text).is_err());
}

#[test]
#[serial]
fn environment_overrides_the_file() {
    std::env::set_var("CV_POLL_INTERVAL_MS", "50");
    std::env::set_var("CV_APPROVAL_TIMEOUT_SECS", "30");
    std::env::set_var("CV_K8S_RUNNER_IMAGE", "conveyor/runner:2");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cv.toml");
    std::fs::write(&path, FULL).unwrap();

    let config = EngineConfig::load(Some(&path)).unwrap();
    std::env::remove_var("CV_POLL_INTERVAL_MS");
    std::env::remove_var("CV_APPROVAL_TIMEOUT_SECS");
    std::env::remove_var("CV_K8S_RUNNER_IMAGE");

    assert_eq!(config.poll_interval(), Duration::from_millis(50));
    assert_eq!(config.approval_timeout(), Duration::from_secs(30));
    assert_eq!(config.workers.kubernetes.unwrap().runner_image, "conveyor/runner:2");
}

#[test]
#[serial]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn local_worker_is_always_available() {
    let dir = tempfile::tempdir().unwrap();
    let workers = EngineConfig::default().build_workers(&ClusterSet::new(), dir.path()).unwrap();
    assert!(workers.get(Infrastructure::Local).is_ok());
    assert!(workers.get(Infrastructure::Kubernetes).is_err());
    assert!(workers.get(Infrastructure::Vm).is_err());
}

#[test]
fn pod_worker_needs_a_runner_image() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::parse("[workers.kubernetes]\nnamespace = \"jobs\"").unwrap();
    assert!(config.build_workers(&ClusterSet::new(), dir.path()).is_err());
}

#[test]
fn integrations_follow_the_file() {
    let integrations = EngineConfig::parse(FULL).unwrap().build_integrations().unwrap();
    assert!(integrations.jira.is_some());
    assert!(integrations.meego.is_none());
    assert!(integrations.nacos().is_err());
}
