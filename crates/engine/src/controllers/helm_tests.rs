// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controllers::test_support::{job, scope, Harness};
use cv_core::{JobTaskSpec, KeyVal, TaskStatus};

fn spec() -> HelmTaskSpec {
    HelmTaskSpec {
        scope: scope(),
        service_name: "web".to_string(),
        release_name: "web".to_string(),
        chart: "charts/web".to_string(),
        chart_version: "1.4.0".to_string(),
        values: vec![KeyVal::new("image.tag", "2")],
    }
}

#[tokio::test(start_paused = true)]
async fn upgrades_the_release() {
    let h = Harness::new();
    let job = h.run(job("helm", JobTaskSpec::HelmDeploy(spec()))).await;
    assert_eq!(job.status, TaskStatus::Passed);
    assert_eq!(h.helm.upgrades(), vec![spec()]);
}

#[tokio::test(start_paused = true)]
async fn upgrade_failure_fails_the_job() {
    let h = Harness::new();
    h.helm.fail_next("chart not found");
    let job = h.run(job("helm", JobTaskSpec::HelmDeploy(spec()))).await;
    assert_eq!(job.status, TaskStatus::Failed);
    assert_eq!(job.error, "helm upgrade of web failed: chart not found");
}
