// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-type compilation.
//!
//! One dispatch function per phase, each a single match over [`JobSpec`]:
//! [`set_preset`], [`merge_args`], [`to_jobs`], [`lint_job`] and
//! [`visit_texts`].

pub mod blue_green;
pub mod build;
pub mod canary;
pub mod deploy;
pub mod distribute;
pub mod freestyle;
pub mod gray;
pub mod integrations;
pub mod patch;
pub mod plugin;
pub mod testing;

use crate::context::{CompileContext, Feature};
use crate::error::CompileError;
use crate::merge;
use crate::scope::CompileScope;
use crate::slug;
use cv_core::spec::{RolloutLocation, RolloutTarget, WorkerRuntime};
use cv_core::task::ClusterScope;
use cv_core::{Infrastructure, Job, JobSpec, JobTask, JobTaskSpec, KeyVal, ServiceModule, TaskStatus};

/// Fill defaults that are still empty. Never touches a set field.
pub fn set_preset(job: &mut Job, ctx: &CompileContext) {
    match &mut job.spec {
        JobSpec::Build(spec) => build::preset(spec, ctx),
        JobSpec::Freestyle(spec) => preset_runtime(&mut spec.runtime, ctx),
        JobSpec::Scanning(spec) => testing::preset_scanning(spec, ctx),
        JobSpec::Testing(spec) => testing::preset_testing(spec, ctx),
        JobSpec::Plugin(spec) => plugin::preset(spec, ctx),
        JobSpec::DistributeImage(spec) => distribute::preset(spec, ctx),
        JobSpec::Deploy(_)
        | JobSpec::HelmDeploy(_)
        | JobSpec::K8sCanaryDeploy(_)
        | JobSpec::K8sCanaryRelease(_)
        | JobSpec::K8sBlueGreenDeploy(_)
        | JobSpec::K8sBlueGreenRelease(_)
        | JobSpec::K8sGrayRelease(_)
        | JobSpec::K8sGrayRollback(_)
        | JobSpec::K8sPatch(_)
        | JobSpec::Jira(_)
        | JobSpec::Nacos(_)
        | JobSpec::Apollo(_)
        | JobSpec::MeegoTransition(_) => {}
    }
}

/// Overlay a run-time job onto its definition. Both must be the same type.
pub fn merge_args(job: &mut Job, runtime: &Job) -> Result<(), CompileError> {
    let mismatch = CompileError::TypeMismatch {
        job: job.name.clone(),
        expected: job.job_type(),
        got: runtime.job_type(),
    };
    match (&mut job.spec, &runtime.spec) {
        (JobSpec::Build(spec), JobSpec::Build(rt)) => build::merge(spec, rt),
        (JobSpec::Deploy(spec), JobSpec::Deploy(rt)) => deploy::merge(spec, rt),
        (JobSpec::HelmDeploy(spec), JobSpec::HelmDeploy(rt)) => deploy::merge_helm(spec, rt),
        (JobSpec::Freestyle(spec), JobSpec::Freestyle(rt)) => freestyle::merge(spec, rt),
        (JobSpec::Scanning(spec), JobSpec::Scanning(rt)) => testing::merge_scanning(spec, rt),
        (JobSpec::Testing(spec), JobSpec::Testing(rt)) => testing::merge_testing(spec, rt),
        (JobSpec::K8sCanaryDeploy(spec), JobSpec::K8sCanaryDeploy(rt)) => {
            merge_rollout_targets(&mut spec.targets, &rt.targets)
        }
        (JobSpec::K8sBlueGreenDeploy(spec), JobSpec::K8sBlueGreenDeploy(rt)) => {
            merge_rollout_targets(&mut spec.targets, &rt.targets)
        }
        (JobSpec::K8sGrayRelease(spec), JobSpec::K8sGrayRelease(rt)) => {
            merge_rollout_targets(&mut spec.targets, &rt.targets)
        }
        (JobSpec::K8sGrayRollback(spec), JobSpec::K8sGrayRollback(rt)) => {
            merge::replace_if_set(&mut spec.workloads, &rt.workloads)
        }
        (JobSpec::K8sPatch(spec), JobSpec::K8sPatch(rt)) => patch::merge(spec, rt),
        (JobSpec::Plugin(spec), JobSpec::Plugin(rt)) => {
            merge::merge_key_vals(&mut spec.plugin.inputs, &rt.plugin.inputs)
        }
        (JobSpec::Jira(spec), JobSpec::Jira(rt)) => merge::replace_if_set(&mut spec.issues, &rt.issues),
        (JobSpec::MeegoTransition(spec), JobSpec::MeegoTransition(rt)) => {
            merge::replace_if_set(&mut spec.work_items, &rt.work_items)
        }
        (JobSpec::Nacos(spec), JobSpec::Nacos(rt)) => merge::replace_if_set(&mut spec.datas, &rt.datas),
        (JobSpec::Apollo(spec), JobSpec::Apollo(rt)) => {
            merge::replace_if_set(&mut spec.namespaces, &rt.namespaces)
        }
        (JobSpec::DistributeImage(spec), JobSpec::DistributeImage(rt)) => {
            merge::replace_if_set(&mut spec.targets, &rt.targets)
        }
        (JobSpec::K8sCanaryRelease(_), JobSpec::K8sCanaryRelease(_))
        | (JobSpec::K8sBlueGreenRelease(_), JobSpec::K8sBlueGreenRelease(_)) => {}
        _ => return Err(mismatch),
    }
    Ok(())
}

/// Compile one definition job into its job tasks.
pub fn to_jobs(job: &Job, scope: &CompileScope<'_>) -> Result<Vec<JobTask>, CompileError> {
    match &job.spec {
        JobSpec::Build(spec) => build::to_jobs(job, spec, scope),
        JobSpec::Deploy(spec) => deploy::to_jobs(job, spec, scope),
        JobSpec::HelmDeploy(spec) => deploy::to_helm_jobs(job, spec, scope),
        JobSpec::Freestyle(spec) => freestyle::to_jobs(job, spec, scope),
        JobSpec::Scanning(spec) => testing::to_scanning_jobs(job, spec, scope),
        JobSpec::Testing(spec) => testing::to_testing_jobs(job, spec, scope),
        JobSpec::K8sCanaryDeploy(spec) => canary::to_deploy_jobs(job, spec, scope),
        JobSpec::K8sCanaryRelease(spec) => canary::to_release_jobs(job, spec, scope),
        JobSpec::K8sBlueGreenDeploy(spec) => blue_green::to_deploy_jobs(job, spec, scope),
        JobSpec::K8sBlueGreenRelease(spec) => blue_green::to_release_jobs(job, spec, scope),
        JobSpec::K8sGrayRelease(spec) => gray::to_release_jobs(job, spec, scope),
        JobSpec::K8sGrayRollback(spec) => gray::to_rollback_jobs(job, spec, scope),
        JobSpec::K8sPatch(spec) => patch::to_jobs(job, spec, scope),
        JobSpec::Plugin(spec) => plugin::to_jobs(job, spec, scope),
        JobSpec::Jira(spec) => integrations::to_jira_jobs(job, spec, scope),
        JobSpec::MeegoTransition(spec) => integrations::to_meego_jobs(job, spec, scope),
        JobSpec::Nacos(spec) => integrations::to_nacos_jobs(job, spec, scope),
        JobSpec::Apollo(spec) => integrations::to_apollo_jobs(job, spec, scope),
        JobSpec::DistributeImage(spec) => distribute::to_jobs(job, spec, scope),
    }
}

/// Per-job checks; the first violation wins.
pub fn lint_job(job: &Job, scope: &CompileScope<'_>) -> Result<(), CompileError> {
    match &job.spec {
        JobSpec::Build(spec) => build::lint(job, spec, scope),
        JobSpec::Deploy(spec) => deploy::lint(job, spec, scope),
        JobSpec::HelmDeploy(spec) => deploy::lint_helm(job, spec, scope),
        JobSpec::Freestyle(spec) => freestyle::lint(job, spec, scope),
        JobSpec::Scanning(spec) => testing::lint_scanning(job, spec, scope),
        JobSpec::Testing(spec) => testing::lint_testing(job, spec, scope),
        JobSpec::K8sCanaryDeploy(spec) => canary::lint_deploy(job, spec, scope),
        JobSpec::K8sCanaryRelease(spec) => canary::lint_release(job, spec, scope),
        JobSpec::K8sBlueGreenDeploy(spec) => blue_green::lint_deploy(job, spec, scope),
        JobSpec::K8sBlueGreenRelease(spec) => blue_green::lint_release(job, spec, scope),
        JobSpec::K8sGrayRelease(spec) => gray::lint_release(job, spec, scope),
        JobSpec::K8sGrayRollback(spec) => gray::lint_rollback(job, spec, scope),
        JobSpec::K8sPatch(spec) => patch::lint(job, spec, scope),
        JobSpec::Plugin(spec) => plugin::lint(job, spec, scope),
        JobSpec::Jira(_) => Ok(()),
        JobSpec::MeegoTransition(_) => require_feature(job, scope.ctx, Feature::Meego),
        JobSpec::Nacos(_) => require_feature(job, scope.ctx, Feature::Nacos),
        JobSpec::Apollo(_) => require_feature(job, scope.ctx, Feature::Apollo),
        JobSpec::DistributeImage(spec) => distribute::lint(job, spec, scope),
    }
}

/// Visit every user-authored string that may carry placeholders.
pub fn visit_texts(job: &mut Job, f: &mut dyn FnMut(&mut String)) {
    match &mut job.spec {
        JobSpec::Build(spec) => build::visit_texts(spec, f),
        JobSpec::Freestyle(spec) => freestyle::visit_texts(spec, f),
        JobSpec::Scanning(spec) => testing::visit_scanning_texts(spec, f),
        JobSpec::Testing(spec) => testing::visit_testing_texts(spec, f),
        JobSpec::Deploy(spec) => {
            for module in spec.services.iter_mut().flat_map(|s| s.modules.iter_mut()) {
                f(&mut module.image);
            }
        }
        JobSpec::HelmDeploy(spec) => {
            for release in &mut spec.releases {
                visit_key_vals(&mut release.values, f);
                for module in &mut release.modules {
                    f(&mut module.image);
                }
            }
        }
        JobSpec::K8sCanaryDeploy(spec) => visit_rollout_targets(&mut spec.targets, f),
        JobSpec::K8sBlueGreenDeploy(spec) => visit_rollout_targets(&mut spec.targets, f),
        JobSpec::K8sGrayRelease(spec) => visit_rollout_targets(&mut spec.targets, f),
        JobSpec::K8sPatch(spec) => {
            for item in &mut spec.items {
                f(&mut item.patch_content);
                visit_key_vals(&mut item.params, f);
            }
        }
        JobSpec::Plugin(spec) => {
            f(&mut spec.plugin.script);
            visit_key_vals(&mut spec.plugin.inputs, f);
        }
        JobSpec::Nacos(spec) => {
            for data in &mut spec.datas {
                f(&mut data.content);
            }
        }
        JobSpec::Apollo(spec) => {
            for ns in &mut spec.namespaces {
                visit_key_vals(&mut ns.kvs, f);
            }
        }
        JobSpec::DistributeImage(spec) => {
            for target in &mut spec.targets {
                f(&mut target.source_image);
                f(&mut target.target_tag);
            }
        }
        JobSpec::K8sCanaryRelease(_)
        | JobSpec::K8sBlueGreenRelease(_)
        | JobSpec::K8sGrayRollback(_)
        | JobSpec::Jira(_)
        | JobSpec::MeegoTransition(_) => {}
    }
}

pub(crate) fn visit_key_vals(kvs: &mut [KeyVal], f: &mut dyn FnMut(&mut String)) {
    for kv in kvs {
        f(&mut kv.value);
    }
}

fn visit_rollout_targets(targets: &mut [RolloutTarget], f: &mut dyn FnMut(&mut String)) {
    for target in targets {
        f(&mut target.image);
    }
}

/// A fresh, not yet started job task.
pub(crate) fn new_task(
    job: &Job,
    key: String,
    service: Option<ServiceModule>,
    spec: JobTaskSpec,
    infrastructure: Infrastructure,
    timeout_secs: u64,
    outputs: Vec<String>,
) -> JobTask {
    JobTask {
        name: slug::task_name(&key),
        key,
        job_name: job.name.clone(),
        job_type: job.job_type(),
        service,
        spec,
        status: TaskStatus::Created,
        error: String::new(),
        infrastructure,
        timeout_secs,
        outputs,
        error_policy: job.error_policy,
        start_time: 0,
        end_time: 0,
    }
}

pub(crate) fn module_key(job: &str, module: &ServiceModule) -> String {
    format!("{}.{}.{}", job, module.service_name, module.service_module)
}

pub(crate) fn preset_runtime(runtime: &mut WorkerRuntime, ctx: &CompileContext) {
    if runtime.infrastructure == Infrastructure::Kubernetes && runtime.image.is_empty() {
        runtime.image = ctx.default_image.clone();
    }
}

pub(crate) fn require_feature(
    job: &Job,
    ctx: &CompileContext,
    feature: Feature,
) -> Result<(), CompileError> {
    if ctx.has(feature) {
        Ok(())
    } else {
        Err(CompileError::LicenseRequired { job: job.name.clone(), feature: feature.to_string() })
    }
}

pub(crate) fn lint_runtime(
    job: &Job,
    runtime: &WorkerRuntime,
    ctx: &CompileContext,
) -> Result<(), CompileError> {
    if runtime.infrastructure == Infrastructure::Vm {
        require_feature(job, ctx, Feature::VmInfrastructure)?;
    }
    Ok(())
}

pub(crate) fn lint_unique_outputs(job: &Job, outputs: &[String]) -> Result<(), CompileError> {
    for (i, output) in outputs.iter().enumerate() {
        if outputs[..i].contains(output) {
            return Err(CompileError::DuplicateOutput { job: job.name.clone(), output: output.clone() });
        }
    }
    Ok(())
}

/// Cluster and namespace of a rollout, from a named environment or given explicitly.
pub(crate) fn cluster_scope(
    job: &str,
    location: &RolloutLocation,
    ctx: &CompileContext,
) -> Result<ClusterScope, CompileError> {
    if !location.env.is_empty() {
        let env = ctx.environment(&location.env).ok_or_else(|| CompileError::UnknownEnvironment {
            job: job.to_string(),
            env: location.env.clone(),
        })?;
        return Ok(ClusterScope {
            env: env.name.clone(),
            cluster_id: env.cluster_id.clone(),
            namespace: env.namespace.clone(),
        });
    }
    if location.namespace.is_empty() {
        return Err(CompileError::missing(job, "namespace"));
    }
    Ok(ClusterScope {
        env: String::new(),
        cluster_id: location.cluster_id.clone(),
        namespace: location.namespace.clone(),
    })
}

/// Overlay run-time images onto rollout targets matched by workload and
/// container. A non-empty overlay also narrows the selection.
pub(crate) fn merge_rollout_targets(base: &mut Vec<RolloutTarget>, overlay: &[RolloutTarget]) {
    if overlay.is_empty() {
        return;
    }
    let same = |a: &RolloutTarget, b: &RolloutTarget| {
        a.workload_name == b.workload_name && a.container_name == b.container_name
    };
    base.retain(|t| overlay.iter().any(|o| same(t, o)));
    for target in base.iter_mut() {
        if let Some(o) = overlay.iter().find(|o| same(target, o)) {
            merge::take_if_set(&mut target.image, &o.image);
            merge::take_if_set(&mut target.k8s_service_name, &o.k8s_service_name);
        }
    }
}

pub(crate) fn lint_rollout_targets(job: &Job, targets: &[RolloutTarget]) -> Result<(), CompileError> {
    if targets.is_empty() {
        return Err(CompileError::missing(&job.name, "targets"));
    }
    for target in targets {
        if target.workload_name.is_empty() || target.container_name.is_empty() {
            return Err(CompileError::missing(&job.name, "target workload_name/container_name"));
        }
    }
    Ok(())
}
