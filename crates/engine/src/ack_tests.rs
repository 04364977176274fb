// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cv_adapters::FakeNotifier;
use cv_core::{JobTaskBuilder, NotifyCtl, StageTask};

fn ctl(webhook_type: &str, notify_on: Vec<TaskStatus>) -> NotifyCtl {
    NotifyCtl {
        enabled: true,
        webhook_type: webhook_type.to_string(),
        address: "https://hooks.example.com/x".to_string(),
        notify_on,
    }
}

fn task(status: TaskStatus, ctls: Vec<NotifyCtl>) -> WorkflowTask {
    let mut task = WorkflowTask {
        workflow_name: "shop".to_string(),
        task_id: 3,
        status,
        task_creator: "ada".to_string(),
        ..WorkflowTask::default()
    };
    task.origin_workflow_args.notify_ctls = ctls;
    task
}

#[tokio::test]
async fn notifies_terminal_status_once() {
    let notifier = FakeNotifier::new();
    let ack = NotifyingAck::new(Arc::new(notifier.clone()));
    let ctls = vec![ctl("feishu", Vec::new())];

    ack.ack(&task(TaskStatus::Running, ctls.clone()));
    ack.ack(&task(TaskStatus::Running, ctls.clone()));
    ack.ack(&task(TaskStatus::Passed, ctls.clone()));
    ack.flush().await;

    let calls = notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].webhook_type, "feishu");
    assert_eq!(calls[0].notification.status, TaskStatus::Passed);
    assert_eq!(calls[0].notification.creator, "ada");
}

#[tokio::test]
async fn honors_status_filters_per_ctl() {
    let notifier = FakeNotifier::new();
    let ack = NotifyingAck::new(Arc::new(notifier.clone()));
    let ctls = vec![
        ctl("dingding", vec![TaskStatus::Running, TaskStatus::Failed]),
        ctl("wechat", vec![TaskStatus::Passed]),
        NotifyCtl { enabled: false, ..ctl("feishu", Vec::new()) },
    ];

    ack.ack(&task(TaskStatus::Running, ctls.clone()));
    ack.ack(&task(TaskStatus::Failed, ctls));
    ack.flush().await;

    let seen: Vec<(String, TaskStatus)> =
        notifier.calls().into_iter().map(|c| (c.webhook_type, c.notification.status)).collect();
    assert_eq!(
        seen,
        vec![("dingding".to_string(), TaskStatus::Running), ("dingding".to_string(), TaskStatus::Failed)]
    );
}

#[test]
fn notification_lists_failed_jobs() {
    let mut task = task(TaskStatus::Failed, Vec::new());
    task.stages.push(StageTask {
        name: "build".to_string(),
        jobs: vec![
            JobTaskBuilder::default().key("a").status(TaskStatus::Passed).build(),
            JobTaskBuilder::default().key("b").status(TaskStatus::Failed).error("exit code 2").build(),
            JobTaskBuilder::default().key("c").status(TaskStatus::Timeout).build(),
            JobTaskBuilder::default().key("d").status(TaskStatus::Cancelled).build(),
        ],
        ..StageTask::default()
    });
    let n = notification(&task);
    assert_eq!(
        n.failures,
        vec![("b".to_string(), "exit code 2".to_string()), ("c".to_string(), "timeout".to_string())]
    );
}

#[tokio::test]
async fn hook_lists_fan_out() {
    let first = FakeNotifier::new();
    let second = FakeNotifier::new();
    let hooks: Vec<Arc<dyn Ack>> = vec![
        Arc::new(NotifyingAck::new(Arc::new(first.clone()))),
        Arc::new(NoAck),
        Arc::new(NotifyingAck::new(Arc::new(second.clone()))),
    ];
    hooks.ack(&task(TaskStatus::Passed, vec![ctl("feishu", Vec::new())]));
    hooks.flush().await;
    assert_eq!(first.calls().len(), 1);
    assert_eq!(second.calls().len(), 1);
}
