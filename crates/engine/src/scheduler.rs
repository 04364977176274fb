// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow task lifecycle.
//!
//! [`Engine::create_task`] compiles and stores a task; [`Engine::start`]
//! walks its stages in order until one does not pass, then settles every
//! remaining stage and job. Each running task owns a cancellation token
//! shared by its stages, approval gates and controllers.

use crate::ack::Ack;
use crate::approval::{self, GateSettings};
use crate::config::EngineConfig;
use crate::deps::ControllerDeps;
use crate::env::DEFAULT_APPROVAL_TIMEOUT_SECS;
use crate::error::EngineError;
use crate::stage::StageRunner;
use crate::state::TaskState;
use cv_compiler::{compile_workflow, lint, prepare, CompileContext};
use cv_core::{TaskStatus, WorkflowArgs, WorkflowDefinition, WorkflowTask};
use cv_storage::TaskStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Timeout of approval gates that set none
    pub approval_timeout: Duration,
    /// Approve every manual gate as soon as it opens
    pub auto_approve: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { approval_timeout: Duration::from_secs(DEFAULT_APPROVAL_TIMEOUT_SECS), auto_approve: false }
    }
}

type TaskKey = (String, i64);

struct Running {
    state: Arc<TaskState>,
    cancel: CancellationToken,
}

struct Inner {
    deps: Arc<ControllerDeps>,
    store: Arc<dyn TaskStore>,
    /// Template; the workflow name and task id are filled in per task
    ctx: CompileContext,
    options: EngineOptions,
    ack: Arc<dyn Ack>,
    running: Mutex<HashMap<TaskKey, Running>>,
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    pub fn new(
        deps: ControllerDeps,
        store: Arc<dyn TaskStore>,
        ctx: CompileContext,
        options: EngineOptions,
        ack: Arc<dyn Ack>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                deps: Arc::new(deps),
                store,
                ctx,
                options,
                ack,
                running: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Wire clusters, workers and integrations from `config`.
    pub async fn from_config(
        config: &EngineConfig,
        store: Arc<dyn TaskStore>,
        ack: Arc<dyn Ack>,
        auto_approve: bool,
    ) -> Result<Self, EngineError> {
        let state_dir = config.state_dir()?;
        let clusters = config.connect_clusters().await?;
        let workers = config.build_workers(&clusters, &state_dir)?;
        let deps = ControllerDeps::new(clusters, workers)
            .helm(Arc::new(cv_adapters::HelmCli::new(config.helm_binary.clone())))
            .integrations(config.build_integrations()?)
            .registries(config.registries.clone())
            .poll_interval(config.poll_interval());
        let options = EngineOptions { approval_timeout: config.approval_timeout(), auto_approve };
        Ok(Self::new(deps, store, config.compile_context(""), options, ack))
    }

    fn context(&self, workflow: &str, task_id: i64) -> CompileContext {
        let mut ctx = self.inner.ctx.clone();
        ctx.workflow_name = workflow.to_string();
        ctx.task_id = task_id;
        ctx
    }

    /// Validate `def` with `args` applied without creating anything.
    pub fn lint(&self, def: &WorkflowDefinition, args: &WorkflowArgs) -> Result<WorkflowDefinition, EngineError> {
        let ctx = self.context(&def.name, 0);
        let prepared = prepare(def, args, &ctx)?;
        lint(&prepared, &ctx)?;
        compile_workflow(&prepared, &ctx)?;
        Ok(prepared)
    }

    /// Compile `def` with `args` and store the new task as Created.
    pub fn create_task(
        &self,
        def: &WorkflowDefinition,
        args: &WorkflowArgs,
        creator: &str,
    ) -> Result<WorkflowTask, EngineError> {
        let prepared = self.lint(def, args)?;
        let task_id = self.inner.store.next_task_id(&def.name)?;
        let stages = compile_workflow(&prepared, &self.context(&def.name, task_id))?;
        let task = WorkflowTask {
            workflow_name: def.name.clone(),
            task_id,
            revision: def.revision,
            status: TaskStatus::Created,
            stages,
            create_time: self.inner.deps.clock.epoch_secs(),
            task_creator: creator.to_string(),
            origin_workflow_args: prepared,
            ..WorkflowTask::default()
        };
        self.inner.store.create_task(&task)?;
        tracing::info!(workflow = %task.workflow_name, task_id, %creator, stages = task.stages.len(), "task created");
        Ok(task)
    }

    /// Start driving a stored task. The handle resolves to its final status.
    pub fn start(&self, workflow: &str, task_id: i64) -> Result<JoinHandle<TaskStatus>, EngineError> {
        let key = (workflow.to_string(), task_id);
        let mut running = self.inner.running.lock();
        if running.contains_key(&key) {
            return Err(EngineError::AlreadyRunning { workflow: workflow.to_string(), task_id });
        }
        let task = self
            .inner
            .store
            .find_task(workflow, task_id)?
            .ok_or_else(|| EngineError::TaskNotFound { workflow: workflow.to_string(), task_id })?;
        if task.status.is_terminal() {
            return Err(EngineError::Finished { workflow: workflow.to_string(), task_id, status: task.status });
        }

        let state = Arc::new(TaskState::new(
            task,
            self.inner.store.clone(),
            self.inner.ack.clone(),
            self.inner.deps.clock.clone(),
        ));
        let cancel = CancellationToken::new();
        running.insert(key.clone(), Running { state: state.clone(), cancel: cancel.clone() });
        drop(running);

        let engine = self.clone();
        Ok(tokio::spawn(async move {
            let status = engine.drive(state, cancel).await;
            engine.inner.running.lock().remove(&key);
            status
        }))
    }

    /// Start a stored task and wait for it to settle.
    pub async fn run(&self, workflow: &str, task_id: i64) -> Result<TaskStatus, EngineError> {
        let handle = self.start(workflow, task_id)?;
        handle.await.map_err(|e| EngineError::Join(e.to_string()))
    }

    async fn drive(&self, state: Arc<TaskState>, cancel: CancellationToken) -> TaskStatus {
        let snapshot = state.snapshot();
        let (workflow, task_id) = (snapshot.workflow_name.clone(), snapshot.task_id);
        state.update(|t, now| t.transition(TaskStatus::Running, now));
        tracing::info!(%workflow, task_id, "task started");

        let runner = StageRunner {
            deps: self.inner.deps.clone(),
            task: state.clone(),
            ctx: self.context(&workflow, task_id),
            gate: GateSettings {
                poll_interval: self.inner.deps.poll_interval,
                default_timeout: self.inner.options.approval_timeout,
                auto_approve: self.inner.options.auto_approve,
            },
            cancel,
        };

        let mut status = TaskStatus::Passed;
        for idx in 0..snapshot.stages.len() {
            let stage_status = runner.run(idx).await;
            if stage_status != TaskStatus::Passed {
                status = stage_status;
                break;
            }
        }
        if runner.cancel.is_cancelled() {
            status = TaskStatus::Cancelled;
        }

        state.update(|t, now| t.finish(status, now));
        let ignored = state.snapshot().ignored_failures().len();
        tracing::info!(%workflow, task_id, %status, ignored_failures = ignored, "task finished");
        state.ack_hook().flush().await;
        status
    }

    /// Cancel a task. A task that never started is settled immediately.
    pub fn cancel(&self, workflow: &str, task_id: i64) -> Result<(), EngineError> {
        if let Some(running) = self.inner.running.lock().get(&(workflow.to_string(), task_id)) {
            tracing::info!(%workflow, task_id, "cancelling task");
            running.cancel.cancel();
            return Ok(());
        }
        let task = self
            .inner
            .store
            .find_task(workflow, task_id)?
            .ok_or_else(|| EngineError::TaskNotFound { workflow: workflow.to_string(), task_id })?;
        if task.status.is_terminal() {
            return Ok(());
        }
        let mut task = task;
        task.finish(TaskStatus::Cancelled, self.inner.deps.clock.epoch_secs());
        self.inner.store.update_task(&task)?;
        self.inner.ack.ack(&task);
        tracing::info!(%workflow, task_id, "cancelled task that never started");
        Ok(())
    }

    /// Record an approval decision on a running task's open gate.
    pub fn approve(
        &self,
        workflow: &str,
        task_id: i64,
        stage: &str,
        user: &str,
        approved: bool,
        comment: &str,
    ) -> Result<(), EngineError> {
        let state = self
            .running_state(workflow, task_id)
            .ok_or_else(|| EngineError::NotRunning { workflow: workflow.to_string(), task_id })?;
        approval::decide(&state, stage, user, approved, comment)
    }

    fn running_state(&self, workflow: &str, task_id: i64) -> Option<Arc<TaskState>> {
        self.inner.running.lock().get(&(workflow.to_string(), task_id)).map(|r| r.state.clone())
    }

    /// The live record of a running task, else the stored one.
    pub fn task(&self, workflow: &str, task_id: i64) -> Result<WorkflowTask, EngineError> {
        if let Some(state) = self.running_state(workflow, task_id) {
            return Ok(state.snapshot());
        }
        self.inner
            .store
            .find_task(workflow, task_id)?
            .ok_or_else(|| EngineError::TaskNotFound { workflow: workflow.to_string(), task_id })
    }

    pub fn tasks(&self, workflow: &str) -> Result<Vec<WorkflowTask>, EngineError> {
        Ok(self.inner.store.list_tasks(workflow)?)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
