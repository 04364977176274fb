// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cv_core::task::ClusterScope;
use cv_core::KeyVal;

fn spec() -> HelmTaskSpec {
    HelmTaskSpec {
        scope: ClusterScope {
            env: "staging".into(),
            cluster_id: "east".into(),
            namespace: "shop".into(),
        },
        service_name: "api".into(),
        release_name: "shop-api".into(),
        chart: "charts/api".into(),
        chart_version: "1.4.0".into(),
        values: vec![KeyVal::new("image.tag", "7")],
    }
}

#[test]
fn upgrade_args_cover_release_settings() {
    let args = upgrade_args(&spec(), Duration::from_secs(300));
    assert_eq!(
        args,
        vec![
            "upgrade", "--install", "shop-api", "charts/api", "--namespace", "shop", "--version",
            "1.4.0", "--kube-context", "east", "--set", "image.tag=7", "--wait", "--timeout",
            "300s",
        ]
    );
}

#[test]
fn local_cluster_uses_current_context() {
    let mut spec = spec();
    spec.scope.cluster_id.clear();
    spec.chart_version.clear();
    let args = upgrade_args(&spec, Duration::from_secs(60));
    assert!(!args.iter().any(|a| a == "--kube-context" || a == "--version"));
}

#[tokio::test]
async fn missing_binary_is_an_upgrade_error() {
    let helm = HelmCli::new("/nonexistent/helm").with_timeout(Duration::from_secs(5));
    let err = helm.upgrade(&spec()).await.unwrap_err();
    assert!(matches!(err, HelmError::Upgrade { ref release, .. } if release == "shop-api"));
}

#[tokio::test]
async fn fake_helm_records_and_fails_once() {
    let helm = FakeHelm::new();
    helm.fail_next("chart not found");
    assert!(helm.upgrade(&spec()).await.is_err());
    helm.upgrade(&spec()).await.unwrap();
    assert_eq!(helm.upgrades(), vec![spec()]);
}
