// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tracker transitions and configuration center publishes.

use super::{fail, JobRun, StepResult};
use cv_core::task::{ConfigTaskSpec, IssueTaskSpec};

fn collect(failed: Vec<String>) -> StepResult {
    if failed.is_empty() {
        Ok(())
    } else {
        Err(fail(format!("failed items: {}", failed.join("; "))))
    }
}

pub(super) async fn transition(run: &JobRun, spec: &IssueTaskSpec) -> StepResult {
    let client = run.deps.integrations.issue_client(spec.tracker).map_err(fail)?;
    let mut failed = Vec::new();
    for item in &spec.transitions {
        run.checkpoint()?;
        match client.transition(&spec.project_key, item).await {
            Ok(()) => tracing::info!(tracker = %spec.tracker, id = %item.id, target = %item.target, "issue moved"),
            Err(e) => {
                tracing::warn!(tracker = %spec.tracker, id = %item.id, error = %e, "issue transition failed");
                failed.push(format!("{} ({})", item.id, e));
            }
        }
    }
    collect(failed)
}

pub(super) async fn publish(run: &JobRun, spec: &ConfigTaskSpec) -> StepResult {
    let mut failed = Vec::new();
    match spec {
        ConfigTaskSpec::Nacos { namespace_id, datas } => {
            let client = run.deps.integrations.nacos().map_err(fail)?;
            for data in datas {
                run.checkpoint()?;
                match client.publish(namespace_id, data).await {
                    Ok(()) => tracing::info!(%namespace_id, data_id = %data.data_id, "nacos config published"),
                    Err(e) => failed.push(format!("{} ({})", data.data_id, e)),
                }
            }
        }
        ConfigTaskSpec::Apollo { namespaces } => {
            let client = run.deps.integrations.apollo().map_err(fail)?;
            for ns in namespaces {
                run.checkpoint()?;
                match client.publish(ns).await {
                    Ok(()) => tracing::info!(app_id = %ns.app_id, namespace = %ns.namespace, "apollo namespace released"),
                    Err(e) => failed.push(format!("{}/{} ({})", ns.app_id, ns.namespace, e)),
                }
            }
        }
    }
    collect(failed)
}

#[cfg(test)]
#[path = "integration_tests.rs"]
mod tests;
