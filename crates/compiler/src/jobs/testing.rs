// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanning and testing jobs compile to freestyle tasks.

use super::freestyle::{instantiate_steps, target_envs};
use super::{lint_runtime, lint_unique_outputs, module_key, new_task, preset_runtime, visit_key_vals};
use crate::context::CompileContext;
use crate::error::CompileError;
use crate::merge;
use crate::resolve;
use crate::scope::CompileScope;
use cv_core::spec::{
    FreestyleKind, ScanningDef, ScanningJobSpec, Step, StepSpec, TestDef, TestingJobSpec,
};
use cv_core::task::FreestyleTaskSpec;
use cv_core::{Job, JobTask, JobTaskSpec, ServiceTarget, TargetSource};

const ARTIFACT_DIR: &str = "artifacts";

pub fn preset_scanning(spec: &mut ScanningJobSpec, ctx: &CompileContext) {
    for def in spec.scannings.iter_mut().chain(spec.template.iter_mut()) {
        preset_runtime(&mut def.runtime, ctx);
    }
}

pub fn preset_testing(spec: &mut TestingJobSpec, ctx: &CompileContext) {
    for def in spec.tests.iter_mut().chain(spec.template.iter_mut()) {
        preset_runtime(&mut def.runtime, ctx);
    }
}

pub fn merge_scanning(spec: &mut ScanningJobSpec, runtime: &ScanningJobSpec) {
    for rt in &runtime.scannings {
        if let Some(def) = spec.scannings.iter_mut().find(|d| d.name == rt.name) {
            merge::merge_repos(&mut def.repos, &rt.repos);
            merge::merge_key_vals(&mut def.key_vals, &rt.key_vals);
        }
    }
    merge::replace_if_set(&mut spec.services, &runtime.services);
}

pub fn merge_testing(spec: &mut TestingJobSpec, runtime: &TestingJobSpec) {
    for rt in &runtime.tests {
        if let Some(def) = spec.tests.iter_mut().find(|d| d.name == rt.name) {
            merge::merge_repos(&mut def.repos, &rt.repos);
            merge::merge_key_vals(&mut def.key_vals, &rt.key_vals);
        }
    }
    merge::replace_if_set(&mut spec.services, &runtime.services);
}

fn scanning_steps(def: &ScanningDef) -> Vec<Step> {
    let mut steps = Vec::new();
    if !def.installs.is_empty() {
        steps.push(Step::new("tools", StepSpec::Tools { installs: def.installs.clone() }));
    }
    if !def.repos.is_empty() {
        steps.push(Step::new("git", StepSpec::Git { repos: def.repos.clone() }));
    }
    if !def.script.trim().is_empty() {
        steps.push(Step::shell("scan", def.script.clone()));
    }
    if let Some(sonar) = &def.sonar {
        steps.push(Step::new("sonar-check", StepSpec::SonarCheck { settings: sonar.clone() }));
    }
    steps
}

fn testing_steps(def: &TestDef) -> Vec<Step> {
    let mut steps = Vec::new();
    if !def.installs.is_empty() {
        steps.push(Step::new("tools", StepSpec::Tools { installs: def.installs.clone() }));
    }
    if !def.repos.is_empty() {
        steps.push(Step::new("git", StepSpec::Git { repos: def.repos.clone() }));
    }
    if !def.script.trim().is_empty() {
        steps.push(Step::shell("test", def.script.clone()));
    }
    if !def.junit_dir.is_empty() {
        steps.push(Step::new("junit-report", StepSpec::JunitReport { report_dir: def.junit_dir.clone() }));
    }
    if !def.archive_paths.is_empty() {
        steps.push(Step::new(
            "archive",
            StepSpec::TarArchive {
                paths: def.archive_paths.clone(),
                result_dir: ARTIFACT_DIR.to_string(),
                file_name: format!("{}-artifacts.tar.gz", def.name),
            },
        ));
    }
    steps
}

fn template_targets(
    scope: &CompileScope<'_>,
    job: &Job,
    source: TargetSource,
    from_job: &str,
    services: &[ServiceTarget],
) -> Result<Vec<ServiceTarget>, CompileError> {
    resolve::service_targets(scope, &job.name, source, from_job, services)
}

pub fn to_scanning_jobs(
    job: &Job,
    spec: &ScanningJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    match spec.kind {
        FreestyleKind::Normal => Ok(spec
            .scannings
            .iter()
            .map(|def| {
                new_task(
                    job,
                    format!("{}.{}", job.name, def.name),
                    None,
                    JobTaskSpec::Freestyle(FreestyleTaskSpec {
                        runtime: def.runtime.clone(),
                        steps: scanning_steps(def),
                        envs: def.key_vals.clone(),
                        registries: Vec::new(),
                    }),
                    def.runtime.infrastructure,
                    scope.ctx.timeout_secs(def.timeout_mins),
                    Vec::new(),
                )
            })
            .collect()),
        FreestyleKind::Service => {
            let Some(template) = &spec.template else {
                return Err(CompileError::missing(&job.name, "template"));
            };
            let steps = scanning_steps(template);
            let targets = template_targets(scope, job, spec.source, &spec.from_job, &spec.services)?;
            Ok(targets
                .iter()
                .map(|target| {
                    new_task(
                        job,
                        module_key(&job.name, &target.module),
                        Some(target.module.clone()),
                        JobTaskSpec::Freestyle(FreestyleTaskSpec {
                            runtime: template.runtime.clone(),
                            steps: instantiate_steps(&steps, target),
                            envs: target_envs(&template.key_vals, target),
                            registries: Vec::new(),
                        }),
                        template.runtime.infrastructure,
                        scope.ctx.timeout_secs(template.timeout_mins),
                        Vec::new(),
                    )
                })
                .collect())
        }
    }
}

pub fn to_testing_jobs(
    job: &Job,
    spec: &TestingJobSpec,
    scope: &CompileScope<'_>,
) -> Result<Vec<JobTask>, CompileError> {
    match spec.kind {
        FreestyleKind::Normal => Ok(spec
            .tests
            .iter()
            .map(|def| {
                new_task(
                    job,
                    format!("{}.{}", job.name, def.name),
                    None,
                    JobTaskSpec::Freestyle(FreestyleTaskSpec {
                        runtime: def.runtime.clone(),
                        steps: testing_steps(def),
                        envs: def.key_vals.clone(),
                        registries: Vec::new(),
                    }),
                    def.runtime.infrastructure,
                    scope.ctx.timeout_secs(def.timeout_mins),
                    def.outputs.clone(),
                )
            })
            .collect()),
        FreestyleKind::Service => {
            let Some(template) = &spec.template else {
                return Err(CompileError::missing(&job.name, "template"));
            };
            let steps = testing_steps(template);
            let targets = template_targets(scope, job, spec.source, &spec.from_job, &spec.services)?;
            Ok(targets
                .iter()
                .map(|target| {
                    new_task(
                        job,
                        module_key(&job.name, &target.module),
                        Some(target.module.clone()),
                        JobTaskSpec::Freestyle(FreestyleTaskSpec {
                            runtime: template.runtime.clone(),
                            steps: instantiate_steps(&steps, target),
                            envs: target_envs(&template.key_vals, target),
                            registries: Vec::new(),
                        }),
                        template.runtime.infrastructure,
                        scope.ctx.timeout_secs(template.timeout_mins),
                        template.outputs.clone(),
                    )
                })
                .collect())
        }
    }
}

pub fn lint_scanning(
    job: &Job,
    spec: &ScanningJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    for def in spec.scannings.iter().chain(spec.template.iter()) {
        lint_runtime(job, &def.runtime, scope.ctx)?;
    }
    match spec.kind {
        FreestyleKind::Normal if spec.scannings.is_empty() => {
            Err(CompileError::missing(&job.name, "scannings"))
        }
        FreestyleKind::Normal => Ok(()),
        FreestyleKind::Service if spec.template.is_none() => {
            Err(CompileError::missing(&job.name, "template"))
        }
        FreestyleKind::Service => {
            template_targets(scope, job, spec.source, &spec.from_job, &spec.services).map(|_| ())
        }
    }
}

pub fn lint_testing(
    job: &Job,
    spec: &TestingJobSpec,
    scope: &CompileScope<'_>,
) -> Result<(), CompileError> {
    for def in spec.tests.iter().chain(spec.template.iter()) {
        lint_unique_outputs(job, &def.outputs)?;
    }
    for def in spec.tests.iter().chain(spec.template.iter()) {
        lint_runtime(job, &def.runtime, scope.ctx)?;
    }
    match spec.kind {
        FreestyleKind::Normal if spec.tests.is_empty() => Err(CompileError::missing(&job.name, "tests")),
        FreestyleKind::Normal => Ok(()),
        FreestyleKind::Service if spec.template.is_none() => {
            Err(CompileError::missing(&job.name, "template"))
        }
        FreestyleKind::Service => {
            template_targets(scope, job, spec.source, &spec.from_job, &spec.services).map(|_| ())
        }
    }
}

pub fn visit_scanning_texts(spec: &mut ScanningJobSpec, f: &mut dyn FnMut(&mut String)) {
    for def in spec.scannings.iter_mut().chain(spec.template.iter_mut()) {
        f(&mut def.script);
        visit_key_vals(&mut def.key_vals, f);
    }
}

pub fn visit_testing_texts(spec: &mut TestingJobSpec, f: &mut dyn FnMut(&mut String)) {
    for def in spec.tests.iter_mut().chain(spec.template.iter_mut()) {
        f(&mut def.script);
        visit_key_vals(&mut def.key_vals, f);
    }
}

#[cfg(test)]
#[path = "testing_tests.rs"]
mod tests;
