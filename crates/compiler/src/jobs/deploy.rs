// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy and helm deploy jobs: one task per service.

use super::new_task;
use crate::error::CompileError;
use crate::merge;
use crate::resolve;
use crate::scope::CompileScope;
use cv_core::spec::{DeployJobSpec, DeployModule, DeployService, HelmDeployJobSpec, HelmRelease};
use cv_core::task::{ClusterScope, ContainerImage, DeployTaskSpec, HelmTaskSpec};
use cv_core::{
    Infrastructure, Job, JobTask, JobTaskSpec, KeyVal, ServiceModule, ServiceTarget, TargetSource,
};

/// The run-time service list is the selection; its module images overlay
/// the stored ones by module name.
pub fn merge(spec: &mut DeployJobSpec, runtime: &DeployJobSpec) {
    merge::take_if_set(&mut spec.env, &runtime.env);
    if runtime.services.is_empty() {
        return;
    }
    let selected = runtime
        .services
        .iter()
        .map(|rt| {
            let mut service = spec
                .services
                .iter()
                .find(|s| s.service_name == rt.service_name)
                .cloned()
                .unwrap_or_else(|| rt.clone());
            merge::take_if_set(&mut service.workload_name, &rt.workload_name);
            merge_modules(&mut service.modules, &rt.modules);
            service
        })
        .collect();
    spec.services = selected;
}

pub fn merge_helm(spec: &mut HelmDeployJobSpec, runtime: &HelmDeployJobSpec) {
    merge::take_if_set(&mut spec.env, &runtime.env);
    for rt in &runtime.releases {
        match spec.releases.iter_mut().find(|r| r.service_name == rt.service_name) {
            Some(release) => {
                merge::take_if_set(&mut release.chart_version, &rt.chart_version);
                merge::merge_key_vals(&mut release.values, &rt.values);
                merge_modules(&mut release.modules, &rt.modules);
            }
            None => spec.releases.push(rt.clone()),
        }
    }
}

fn merge_modules(base: &mut Vec<DeployModule>, overlay: &[DeployModule]) {
    for module in overlay {
        match base.iter_mut().find(|m| m.service_module == module.service_module) {
            Some(existing) => {
                merge::take_if_set(&mut existing.image, &module.image);
                merge::take_if_set(&mut existing.value_path, &module.value_path);
            }
            None => base.push(module.clone()),
        }
    }
}

fn env_scope(job: &str, env: &str, scope: &CompileScope<'_>) -> Result<ClusterScope, CompileError> {
    let found = scope.ctx.environment(env).ok_or_else(|| CompileError::UnknownEnvironment {
        job: job.to_string(),
        env: env.to_string(),
    })?;
    Ok(ClusterScope {
        env: found.name.clone(),
        cluster_id: found.cluster_id.clone(),
        namespace: found.namespace.clone(),
    })
}

/// Services to deploy. From an origin job, the stored selection (if any)
/// narrows the upstream targets and every selected module must exist there.
pub fn resolved_services(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &DeployJobSpec,
) -> Result<Vec<DeployService>, CompileError> {
    if spec.source == TargetSource::Runtime {
        return Ok(spec.services.clone());
    }
    if spec.from_job.is_empty() {
        return Err(CompileError::missing(job, "from_job"));
    }
    let upstream = resolve::origin_targets(scope, job, &spec.from_job)?;
    let image_of = |module: &ServiceModule| {
        upstream.iter().find(|t| &t.module == module).map(|t| t.image.clone())
    };

    if spec.services.is_empty() {
        return Ok(group_by_service(&upstream));
    }
    let mut services = Vec::with_capacity(spec.services.len());
    for selected in &spec.services {
        let mut service = selected.clone();
        for module in &mut service.modules {
            let key = ServiceModule::new(service.service_name.as_str(), module.service_module.as_str());
            match image_of(&key) {
                Some(image) => module.image = image,
                None => {
                    return Err(CompileError::TargetMissing {
                        job: job.to_string(),
                        from: spec.from_job.clone(),
                        target: key.to_string(),
                    })
                }
            }
        }
        if service.modules.is_empty() {
            service.modules = upstream
                .iter()
                .filter(|t| t.module.service_name == service.service_name)
                .map(|t| DeployModule {
                    service_module: t.module.service_module.clone(),
                    image: t.image.clone(),
                    value_path: String::new(),
                })
                .collect();
        }
        services.push(service);
    }
    Ok(services)
}

fn group_by_service(targets: &[ServiceTarget]) -> Vec<DeployService> {
    let mut services: Vec<DeployService> = Vec::new();
    for target in targets {
        let module = DeployModule {
            service_module: target.module.service_module.clone(),
            image: target.image.clone(),
            value_path: String::new(),
        };
        match services.iter_mut().find(|s| s.service_name == target.module.service_name) {
            Some(service) => service.modules.push(module),
            None => services.push(DeployService {
                service_name: target.module.service_name.clone(),
                workload_name: String::new(),
                modules: vec![module],
            }),
        }
    }
    services
}

fn flatten(services: &[DeployService]) -> Vec<ServiceTarget> {
    services
        .iter()
        .flat_map(|s| {
            s.modules.iter().map(move |m| ServiceTarget {
                module: ServiceModule::new(s.service_name.as_str(), m.service_module.as_str()),
                image: m.image.clone(),
                ..ServiceTarget::default()
            })
        })
        .collect()
}

pub fn targets(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &DeployJobSpec,
) -> Result<Vec<ServiceTarget>, CompileError> {
    Ok(flatten(&resolved_services(scope, job, spec)?))
}

pub fn to_jobs(
    job: &Job,
    spec: &DeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let cluster = env_scope(&job.name, &spec.env, scope)?;
    let services = resolved_services(scope, &job.name, spec)?;
    let mut tasks = Vec::with_capacity(services.len());
    for service in &services {
        let containers = service
            .modules
            .iter()
            .map(|m| ContainerImage { name: m.service_module.clone(), image: m.image.clone() })
            .collect();
        tasks.push(new_task(
            job,
            format!("{}.{}", job.name, service.service_name),
            Some(ServiceModule::new(service.service_name.as_str(), "")),
            JobTaskSpec::Deploy(DeployTaskSpec {
                scope: cluster.clone(),
                service_name: service.service_name.clone(),
                workload_name: service.workload().to_string(),
                containers,
                production: spec.production,
                skip_check_run_status: spec.skip_check_run_status,
            }),
            Infrastructure::Kubernetes,
            scope.ctx.timeout_secs(spec.timeout_mins),
            Vec::new(),
        ));
    }
    Ok(tasks)
}

pub fn lint(job: &Job, spec: &DeployJobSpec, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    env_scope(&job.name, &spec.env, scope)?;
    let services = resolved_services(scope, &job.name, spec)?;
    if services.is_empty() && spec.source == TargetSource::Runtime {
        return Err(CompileError::missing(&job.name, "services"));
    }
    // Images chosen at run time may still be empty in a stored definition.
    if spec.source == TargetSource::FromJob {
        for service in &services {
            if let Some(m) = service.modules.iter().find(|m| m.image.is_empty()) {
                return Err(CompileError::missing(
                    &job.name,
                    format!("image for {}/{}", service.service_name, m.service_module),
                ));
            }
        }
    }
    Ok(())
}

/// Releases with module images resolved from the origin job, if any.
pub fn resolved_releases(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &HelmDeployJobSpec,
) -> Result<Vec<HelmRelease>, CompileError> {
    if spec.source == TargetSource::Runtime {
        return Ok(spec.releases.clone());
    }
    if spec.from_job.is_empty() {
        return Err(CompileError::missing(job, "from_job"));
    }
    let upstream = resolve::origin_targets(scope, job, &spec.from_job)?;
    let mut releases = spec.releases.clone();
    for release in &mut releases {
        if release.modules.is_empty() {
            release.modules = upstream
                .iter()
                .filter(|t| t.module.service_name == release.service_name)
                .map(|t| DeployModule {
                    service_module: t.module.service_module.clone(),
                    image: t.image.clone(),
                    value_path: String::new(),
                })
                .collect();
            continue;
        }
        for module in &mut release.modules {
            let key = ServiceModule::new(release.service_name.as_str(), module.service_module.as_str());
            let Some(target) = upstream.iter().find(|t| t.module == key) else {
                return Err(CompileError::TargetMissing {
                    job: job.to_string(),
                    from: spec.from_job.clone(),
                    target: key.to_string(),
                });
            };
            module.image = target.image.clone();
        }
    }
    Ok(releases)
}

pub fn helm_targets(
    scope: &CompileScope<'_>,
    job: &str,
    spec: &HelmDeployJobSpec,
) -> Result<Vec<ServiceTarget>, CompileError> {
    let releases = resolved_releases(scope, job, spec)?;
    Ok(releases
        .iter()
        .flat_map(|r| {
            r.modules.iter().map(move |m| ServiceTarget {
                module: ServiceModule::new(r.service_name.as_str(), m.service_module.as_str()),
                image: m.image.clone(),
                ..ServiceTarget::default()
            })
        })
        .collect())
}

pub fn to_helm_jobs(
    job: &Job,
    spec: &HelmDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    let cluster = env_scope(&job.name, &spec.env, scope)?;
    let releases = resolved_releases(scope, &job.name, spec)?;
    let mut tasks = Vec::with_capacity(releases.len());
    for release in &releases {
        let mut values = release.values.clone();
        let image_values: Vec<KeyVal> = release
            .modules
            .iter()
            .filter(|m| !m.image.is_empty())
            .map(|m| KeyVal::new(m.helm_value_path(), m.image.as_str()))
            .collect();
        merge::merge_key_vals(&mut values, &image_values);
        tasks.push(new_task(
            job,
            format!("{}.{}", job.name, release.service_name),
            Some(ServiceModule::new(release.service_name.as_str(), "")),
            JobTaskSpec::HelmDeploy(HelmTaskSpec {
                scope: cluster.clone(),
                service_name: release.service_name.clone(),
                release_name: release.release().to_string(),
                chart: release.chart.clone(),
                chart_version: release.chart_version.clone(),
                values,
            }),
            Infrastructure::Kubernetes,
            scope.ctx.timeout_secs(spec.timeout_mins),
            Vec::new(),
        ));
    }
    Ok(tasks)
}

pub fn lint_helm(
    job: &Job,
    spec: &HelmDeployJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    env_scope(&job.name, &spec.env, scope)?;
    if spec.releases.is_empty() {
        return Err(CompileError::missing(&job.name, "releases"));
    }
    if let Some(release) = spec.releases.iter().find(|r| r.chart.is_empty()) {
        return Err(CompileError::missing(&job.name, format!("chart for {}", release.service_name)));
    }
    resolved_releases(scope, &job.name, spec)?;
    Ok(())
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
