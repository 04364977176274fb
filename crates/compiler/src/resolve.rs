// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Origin-job target resolution.
//!
//! A job sourced `from_job` inherits the service/module targets of an
//! earlier job. Only jobs that produce a concrete target list can be an
//! origin; anything else is a compile error.

use crate::error::CompileError;
use crate::jobs;
use crate::merge;
use crate::scope::CompileScope;
use cv_core::spec::FreestyleKind;
use cv_core::{JobSpec, ServiceTarget};

/// Targets produced by `from`, as seen by `job`.
pub fn origin_targets(
    scope: &CompileScope<'_>,
    job: &str,
    from: &str,
) -> Result<Vec<ServiceTarget>, CompileError> {
    let origin = scope.origin(job, from)?;
    let unsupported = || CompileError::UnsupportedOrigin {
        job: job.into(),
        from: from.into(),
        job_type: origin.job_type(),
    };
    match &origin.spec {
        JobSpec::Build(spec) => jobs::build::targets(scope, &origin.name, spec),
        JobSpec::Deploy(spec) => jobs::deploy::targets(scope, &origin.name, spec),
        JobSpec::HelmDeploy(spec) => jobs::deploy::helm_targets(scope, &origin.name, spec),
        JobSpec::DistributeImage(spec) => jobs::distribute::targets(scope, &origin.name, spec),
        JobSpec::Freestyle(spec) if spec.kind == FreestyleKind::Service => {
            service_targets(scope, &origin.name, spec.source, &spec.from_job, &spec.services)
        }
        JobSpec::Scanning(spec) if spec.kind == FreestyleKind::Service => {
            service_targets(scope, &origin.name, spec.source, &spec.from_job, &spec.services)
        }
        JobSpec::Testing(spec) if spec.kind == FreestyleKind::Service => {
            service_targets(scope, &origin.name, spec.source, &spec.from_job, &spec.services)
        }
        _ => Err(unsupported()),
    }
}

/// Targets of a service-kind job: the run-time selection, or the origin's
/// targets with the captured overrides re-attached.
pub fn service_targets(
    scope: &CompileScope<'_>,
    job: &str,
    source: cv_core::TargetSource,
    from_job: &str,
    services: &[ServiceTarget],
) -> Result<Vec<ServiceTarget>, CompileError> {
    match source {
        cv_core::TargetSource::Runtime => Ok(dedup_targets(services.to_vec())),
        cv_core::TargetSource::FromJob => {
            if from_job.is_empty() {
                return Err(CompileError::missing(job, "from_job"));
            }
            let upstream = origin_targets(scope, job, from_job)?;
            attach_overrides(job, from_job, upstream, services)
        }
    }
}

/// Re-attach captured per-target repo/key-val overrides onto the upstream
/// list. A captured target the upstream no longer produces is an error.
pub fn attach_overrides(
    job: &str,
    from: &str,
    upstream: Vec<ServiceTarget>,
    captured: &[ServiceTarget],
) -> Result<Vec<ServiceTarget>, CompileError> {
    let mut targets = dedup_targets(upstream);
    for overlay in captured {
        let Some(target) = targets.iter_mut().find(|t| t.module == overlay.module) else {
            return Err(CompileError::TargetMissing {
                job: job.into(),
                from: from.into(),
                target: overlay.module.to_string(),
            });
        };
        merge::merge_target(target, overlay);
    }
    Ok(targets)
}

/// Drop repeated (service, module) entries, keeping the first.
pub fn dedup_targets(targets: Vec<ServiceTarget>) -> Vec<ServiceTarget> {
    let mut out: Vec<ServiceTarget> = Vec::with_capacity(targets.len());
    for target in targets {
        if !out.iter().any(|t| t.module == target.module) {
            out.push(target);
        }
    }
    out
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
