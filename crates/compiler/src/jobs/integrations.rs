// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue tracker transitions and configuration-center publishes.
//!
//! These run on the engine host against external APIs; no worker is involved.

use super::new_task;
use crate::error::CompileError;
use crate::scope::CompileScope;
use cv_core::spec::{ApolloJobSpec, JiraJobSpec, MeegoJobSpec, NacosJobSpec};
use cv_core::task::{ConfigTaskSpec, IssueTaskSpec, IssueTracker};
use cv_core::{Infrastructure, Job, JobTask, JobTaskSpec};

fn single(job: &Job, spec: JobTaskSpec, scope: &CompileScope<'_>) -> Vec<JobTask> {
    vec![new_task(
        job,
        job.name.clone(),
        None,
        spec,
        Infrastructure::Local,
        scope.ctx.timeout_secs(0),
        Vec::new(),
    )]
}

pub fn to_jira_jobs(
    job: &Job,
    spec: &JiraJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(single(
        job,
        JobTaskSpec::IssueTransition(IssueTaskSpec {
            tracker: IssueTracker::Jira,
            project_key: spec.project_key.clone(),
            transitions: spec.issues.clone(),
        }),
        scope,
    ))
}

pub fn to_meego_jobs(
    job: &Job,
    spec: &MeegoJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(single(
        job,
        JobTaskSpec::IssueTransition(IssueTaskSpec {
            tracker: IssueTracker::Meego,
            project_key: spec.project_key.clone(),
            transitions: spec.work_items.clone(),
        }),
        scope,
    ))
}

pub fn to_nacos_jobs(
    job: &Job,
    spec: &NacosJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(single(
        job,
        JobTaskSpec::ConfigPublish(ConfigTaskSpec::Nacos {
            namespace_id: spec.namespace_id.clone(),
            datas: spec.datas.clone(),
        }),
        scope,
    ))
}

pub fn to_apollo_jobs(
    job: &Job,
    spec: &ApolloJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    Ok(single(
        job,
        JobTaskSpec::ConfigPublish(ConfigTaskSpec::Apollo { namespaces: spec.namespaces.clone() }),
        scope,
    ))
}
