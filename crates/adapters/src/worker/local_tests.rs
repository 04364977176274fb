// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cv_core::spec::Step;
use std::time::Duration;

fn ctx(script: &str, outputs: &[&str]) -> JobContext {
    JobContext {
        workflow_name: "wf".to_string(),
        task_id: 9,
        job_key: "job.unit".to_string(),
        steps: vec![Step::shell("main", script)],
        outputs: outputs.iter().map(|s| s.to_string()).collect(),
        ..JobContext::default()
    }
}

async fn wait_terminal(worker: &LocalWorker, handle: &WorkerHandle) -> WorkerReport {
    for _ in 0..500 {
        let report = worker.poll(handle).await.unwrap();
        if report.state.is_terminal() {
            return report;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job did not finish");
}

#[tokio::test]
async fn runs_steps_and_reports_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let worker = LocalWorker::new(dir.path());
    let handle = worker.start(&ctx("V=ok", &["V"]), &WorkerRuntime::default()).await.unwrap();

    let report = wait_terminal(&worker, &handle).await;

    assert_eq!(report.state, WorkerState::Succeeded);
    assert_eq!(report.outputs["V"], "ok");
    // Polling again returns the cached report
    assert_eq!(worker.poll(&handle).await.unwrap(), report);
}

#[tokio::test]
async fn failed_script_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let worker = LocalWorker::new(dir.path());
    let handle = worker.start(&ctx("exit 4", &[]), &WorkerRuntime::default()).await.unwrap();

    let report = wait_terminal(&worker, &handle).await;

    assert_eq!(report.state, WorkerState::Failed);
    assert!(report.error.contains("exit code 4"));
}

#[tokio::test]
async fn cancel_stops_running_job() {
    let dir = tempfile::tempdir().unwrap();
    let worker = LocalWorker::new(dir.path());
    let handle = worker.start(&ctx("sleep 30", &[]), &WorkerRuntime::default()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    worker.cancel(&handle).await.unwrap();

    assert_eq!(wait_terminal(&worker, &handle).await.state, WorkerState::Cancelled);
}

#[tokio::test]
async fn cleanup_removes_job_dir_and_forgets_handle() {
    let dir = tempfile::tempdir().unwrap();
    let worker = LocalWorker::new(dir.path());
    let job = ctx("true", &[]);
    let job_dir = worker.job_dir(&job).unwrap();
    let handle = worker.start(&job, &WorkerRuntime::default()).await.unwrap();
    wait_terminal(&worker, &handle).await;
    assert!(job_dir.exists());

    worker.cleanup(&handle).await.unwrap();

    assert!(!job_dir.exists());
    assert!(matches!(worker.poll(&handle).await, Err(WorkerError::UnknownHandle(_))));
}

#[yare::parameterized(
    parent = { "../escape" },
    absolute = { "/etc" },
    nested_parent = { "a/../../b" },
)]
fn escaping_workspace_is_refused(workspace: &str) {
    let worker = LocalWorker::new("/tmp/cv-root");
    let mut job = ctx("true", &[]);
    job.workspace = workspace.to_string();
    assert!(matches!(worker.job_dir(&job), Err(WorkerError::Start(_))));
}

#[test]
fn default_job_dir_is_scoped_by_task() {
    let worker = LocalWorker::new("/tmp/cv-root");
    assert_eq!(
        worker.job_dir(&ctx("true", &[])).unwrap(),
        PathBuf::from("/tmp/cv-root/wf/9/job.unit")
    );
}
