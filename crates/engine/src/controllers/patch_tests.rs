// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controllers::test_support::{job, scope, Harness, NS};
use cv_core::task::ResolvedPatch;
use cv_core::{GroupVersionKind, JobTaskSpec, PatchStrategy, TaskStatus};

fn item(name: &str, strategy: PatchStrategy, patch: &str) -> ResolvedPatch {
    ResolvedPatch {
        resource_name: name.to_string(),
        gvk: GroupVersionKind::new("", "v1", "ConfigMap"),
        strategy,
        patch: patch.to_string(),
    }
}

fn seed(h: &Harness) {
    for name in ["app-config", "feature-flags", "limits"] {
        h.cluster.insert_resource(NS, "ConfigMap", name);
    }
}

#[tokio::test(start_paused = true)]
async fn applies_every_item() {
    let h = Harness::new();
    seed(&h);
    let spec = PatchTaskSpec {
        scope: scope(),
        items: vec![
            item("app-config", PatchStrategy::Merge, r#"{"data":{"level":"debug"}}"#),
            item("limits", PatchStrategy::Json, r#"[{"op":"add","path":"/data/cpu","value":"2"}]"#),
        ],
    };
    let job = h.run(job("patch", JobTaskSpec::K8sPatch(spec))).await;
    assert_eq!(job.status, TaskStatus::Passed, "{}", job.error);

    let config = h.cluster.resource(NS, "ConfigMap", "app-config").unwrap();
    assert_eq!(config["data"]["level"], "debug");
}

#[tokio::test(start_paused = true)]
async fn malformed_item_fails_only_itself() {
    let h = Harness::new();
    seed(&h);
    let spec = PatchTaskSpec {
        scope: scope(),
        items: vec![
            item("app-config", PatchStrategy::Merge, r#"{"data":{"level":"debug"}}"#),
            item("feature-flags", PatchStrategy::Merge, "{not json"),
            item("limits", PatchStrategy::Merge, r#"{"data":{"cpu":"2"}}"#),
        ],
    };
    let job = h.run(job("patch", JobTaskSpec::K8sPatch(spec))).await;

    assert_eq!(job.status, TaskStatus::Failed);
    assert!(job.error.starts_with("failed items: feature-flags ("), "{}", job.error);
    assert!(!job.error.contains("app-config"));
    assert!(!job.error.contains("limits"));
    assert_eq!(h.cluster.resource(NS, "ConfigMap", "app-config").unwrap()["data"]["level"], "debug");
    assert_eq!(h.cluster.resource(NS, "ConfigMap", "limits").unwrap()["data"]["cpu"], "2");
}

#[tokio::test(start_paused = true)]
async fn missing_resource_is_reported() {
    let h = Harness::new();
    let spec = PatchTaskSpec {
        scope: scope(),
        items: vec![item("ghost", PatchStrategy::Merge, r#"{"data":{}}"#)],
    };
    let job = h.run(job("patch", JobTaskSpec::K8sPatch(spec))).await;
    assert_eq!(job.status, TaskStatus::Failed);
    assert_eq!(job.error, "failed items: ghost (resource ghost not found)");
}
