// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes resource patches.

use super::{cluster_scope, new_task};
use crate::error::CompileError;
use crate::merge;
use crate::scope::CompileScope;
use crate::template;
use cv_core::spec::PatchJobSpec;
use cv_core::task::{PatchTaskSpec, ResolvedPatch};
use cv_core::{Infrastructure, Job, JobTask, JobTaskSpec};
use std::collections::HashMap;

/// Run-time params overlay the stored ones of the same resource.
pub fn merge(spec: &mut PatchJobSpec, runtime: &PatchJobSpec) {
    for rt in &runtime.items {
        if let Some(item) = spec.items.iter_mut().find(|i| i.resource_name == rt.resource_name) {
            merge::merge_key_vals(&mut item.params, &rt.params);
        }
    }
}

pub fn to_jobs(
    job: &Job,
    spec: &PatchJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let items = spec
        .items
        .iter()
        .map(|item| {
            let params: HashMap<&str, &str> =
                item.params.iter().map(|kv| (kv.key.as_str(), kv.value.as_str())).collect();
            ResolvedPatch {
                resource_name: item.resource_name.clone(),
                gvk: item.gvk.clone(),
                strategy: item.patch_strategy,
                patch: template::render_patch(&item.patch_content, &params),
            }
        })
        .collect();
    Ok(vec![new_task(
        job,
        job.name.clone(),
        None,
        JobTaskSpec::K8sPatch(PatchTaskSpec {
            scope: cluster_scope(&job.name, &spec.location, scope.ctx)?,
            items,
        }),
        Infrastructure::Kubernetes,
        scope.ctx.timeout_secs(spec.timeout_mins),
        Vec::new(),
    )])
}

pub fn lint(job: &Job, spec: &PatchJobSpec, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    if spec.items.is_empty() {
        return Err(CompileError::EmptyPatchItems { job: job.name.clone() });
    }
    if let Some(item) = spec.items.iter().find(|i| i.resource_name.is_empty() || i.gvk.kind.is_empty()) {
        return Err(CompileError::missing(
            &job.name,
            format!("resource name and kind for patch {}", item.resource_name),
        ));
    }
    cluster_scope(&job.name, &spec.location, scope.ctx)?;
    Ok(())
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
