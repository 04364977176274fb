// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cv_core::JobType;
use thiserror::Error;

/// Errors raised while linting or compiling a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("duplicate stage name: {0}")]
    DuplicateStage(String),
    #[error("duplicate job name: {0}")]
    DuplicateJob(String),
    #[error("duplicate job task key: {0}")]
    DuplicateKey(String),
    #[error("job {job}: output {output} declared more than once")]
    DuplicateOutput { job: String, output: String },
    #[error("job {job}: {feature} requires a license entitlement")]
    LicenseRequired { job: String, feature: String },
    #[error("job {job}: reference {reference} does not name a declared output")]
    UnknownOutputRef { job: String, reference: String },
    #[error("job {job}: reference {reference} is not produced by an earlier stage")]
    OutputNotUpstream { job: String, reference: String },
    #[error("job {job}: gray scale {scale} out of range ({range})")]
    GrayScaleOutOfRange { job: String, scale: u32, range: &'static str },
    #[error("job {job}: canary percentage {percentage} out of range (1-100)")]
    PercentageOutOfRange { job: String, percentage: u32 },
    #[error("job {job}: no patch items")]
    EmptyPatchItems { job: String },
    #[error("job {job}: origin job {from} not found")]
    UnknownOriginJob { job: String, from: String },
    #[error("job {job}: origin job {from} does not run before it")]
    OriginNotUpstream { job: String, from: String },
    #[error("job {job}: origin job {from} is a {job_type} job and cannot provide targets")]
    UnsupportedOrigin { job: String, from: String, job_type: JobType },
    #[error("job {job}: target {target} is not provided by origin job {from}")]
    TargetMissing { job: String, from: String, target: String },
    #[error("job {job}: baseline of origin job {from} has not been captured")]
    BaselineNotCaptured { job: String, from: String },
    #[error("job {job}: unknown environment {env}")]
    UnknownEnvironment { job: String, env: String },
    #[error("job {job}: unknown registry {registry}")]
    UnknownRegistry { job: String, registry: String },
    #[error("unknown workflow parameter: {0}")]
    UnknownParam(String),
    #[error("run-time arguments name unknown job: {0}")]
    UnknownJob(String),
    #[error("job {job}: run-time arguments are a {got} job, definition is {expected}")]
    TypeMismatch { job: String, expected: JobType, got: JobType },
    #[error("job {job}: missing {field}")]
    MissingField { job: String, field: String },
}

impl CompileError {
    pub(crate) fn missing(job: &str, field: impl Into<String>) -> Self {
        CompileError::MissingField { job: job.to_string(), field: field.into() }
    }
}
