// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controllers::test_support::{job, Harness};
use cv_adapters::{IntegrationCall, Integrations};
use cv_core::spec::{ApolloNamespace, IssueTransition, NacosData};
use cv_core::task::IssueTracker;
use cv_core::{JobTaskSpec, TaskStatus};

fn issues(ids: &[&str]) -> IssueTaskSpec {
    IssueTaskSpec {
        tracker: IssueTracker::Jira,
        project_key: "SHOP".to_string(),
        transitions: ids
            .iter()
            .map(|id| IssueTransition { id: id.to_string(), target: "Done".to_string() })
            .collect(),
    }
}

#[tokio::test(start_paused = true)]
async fn moves_every_issue() {
    let h = Harness::new();
    let job = h.run(job("jira", JobTaskSpec::IssueTransition(issues(&["SHOP-1", "SHOP-2"])))).await;
    assert_eq!(job.status, TaskStatus::Passed);
    assert_eq!(
        h.integrations.calls(),
        vec![
            IntegrationCall::Transition {
                project_key: "SHOP".to_string(),
                id: "SHOP-1".to_string(),
                target: "Done".to_string()
            },
            IntegrationCall::Transition {
                project_key: "SHOP".to_string(),
                id: "SHOP-2".to_string(),
                target: "Done".to_string()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn rejected_issue_does_not_stop_the_rest() {
    let h = Harness::new();
    h.integrations.fail_item("SHOP-1");
    let job = h.run(job("jira", JobTaskSpec::IssueTransition(issues(&["SHOP-1", "SHOP-2"])))).await;

    assert_eq!(job.status, TaskStatus::Failed);
    assert_eq!(job.error, "failed items: SHOP-1 (rejected with 400: SHOP-1 rejected)");
    assert_eq!(h.integrations.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn unconfigured_tracker_fails() {
    let h = Harness::new().with_deps(|deps| deps.integrations(Integrations::default()));
    let job = h.run(job("jira", JobTaskSpec::IssueTransition(issues(&["SHOP-1"])))).await;
    assert_eq!(job.status, TaskStatus::Failed);
    assert_eq!(job.error, "jira integration is not configured");
}

#[tokio::test(start_paused = true)]
async fn publishes_nacos_configs() {
    let h = Harness::new();
    let spec = ConfigTaskSpec::Nacos {
        namespace_id: "prod".to_string(),
        datas: vec![NacosData {
            data_id: "shop.yaml".to_string(),
            group: "DEFAULT_GROUP".to_string(),
            format: "yaml".to_string(),
            content: "level: info".to_string(),
        }],
    };
    let job = h.run(job("nacos", JobTaskSpec::ConfigPublish(spec))).await;
    assert_eq!(job.status, TaskStatus::Passed);
    assert_eq!(
        h.integrations.calls(),
        vec![IntegrationCall::Nacos { namespace_id: "prod".to_string(), data_id: "shop.yaml".to_string() }]
    );
}

#[tokio::test(start_paused = true)]
async fn apollo_failures_name_the_namespace() {
    let h = Harness::new();
    h.integrations.fail_item("application");
    let spec = ConfigTaskSpec::Apollo {
        namespaces: vec![ApolloNamespace {
            app_id: "shop".to_string(),
            env: "PRO".to_string(),
            cluster: "default".to_string(),
            namespace: "application".to_string(),
            kvs: Vec::new(),
        }],
    };
    let job = h.run(job("apollo", JobTaskSpec::ConfigPublish(spec))).await;
    assert_eq!(job.status, TaskStatus::Failed);
    assert_eq!(job.error, "failed items: shop/application (rejected with 400: application rejected)");
}
