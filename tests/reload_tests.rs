//! 模型重载与并发决策测试

use access_system::{
    error::AppError,
    models::{CredentialId, Grant, GrantId, ScheduleId},
    repository::{AccessModel, ModelBuilder},
    services::{
        model_loader, AuditService, DecisionService, FileModelSource, ModelHandle, ModelSource,
        ReloadService,
    },
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::{card, monday, schedule, OFFICE_DOCUMENT};

/// 卡 1 在 door-a 上有 `count` 个全天时间表，ID 从 `first_id` 开始
fn generation(first_id: u64, count: u64) -> AccessModel {
    let mut builder = ModelBuilder::new();
    builder.add_credential(card(1, "0a", None)).unwrap();
    for id in first_id..first_id + count {
        builder
            .add_schedule(schedule(id, 1, 0, 23))
            .unwrap()
            .add_grant(
                Grant::new(GrantId(id), ScheduleId(id))
                    .with_credential(CredentialId(1))
                    .with_target("door-a"),
            )
            .unwrap();
    }
    builder.build().unwrap()
}

#[test]
fn test_concurrent_decisions_see_one_model() {
    let v1: BTreeSet<ScheduleId> = (1..=3).map(ScheduleId).collect();
    let v2: BTreeSet<ScheduleId> = (11..=15).map(ScheduleId).collect();

    let handle = Arc::new(ModelHandle::new(generation(1, 3)));
    let service = Arc::new(DecisionService::new(
        handle.clone(),
        Arc::new(AuditService::new(0)),
    ));
    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let mut workers = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            let (v1, v2, stop) = (&v1, &v2, &stop);
            workers.push(scope.spawn(move || {
                let mut seen = 0usize;
                while !stop.load(Ordering::Relaxed) || seen == 0 {
                    let decision = service.decide_by_id(CredentialId(1), Some("door-a"), monday(12, 0));
                    let summary = decision.profile().expect("granted").summary();
                    let ids: BTreeSet<ScheduleId> =
                        summary.targets["door-a"].iter().copied().collect();
                    assert_eq!(ids.len(), summary.targets["door-a"].len());
                    assert!(ids == *v1 || ids == *v2, "spliced profile: {ids:?}");
                    seen += 1;
                }
                seen
            }));
        }

        for round in 0..200 {
            let next = if round % 2 == 0 {
                generation(11, 5)
            } else {
                generation(1, 3)
            };
            handle.replace(next);
        }
        stop.store(true, Ordering::Relaxed);

        for worker in workers {
            assert!(worker.join().unwrap() > 0);
        }
    });

    assert_eq!(handle.version(), 201);
}

/// 内容可替换的内存模型来源
struct MemorySource {
    json: Mutex<String>,
}

#[async_trait]
impl ModelSource for MemorySource {
    async fn load(&self) -> Result<AccessModel, AppError> {
        let json = self.json.lock().unwrap().clone();
        model_loader::load_from_str(&json)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[tokio::test]
async fn test_reload_on_request_and_failure_keeps_model() {
    let source = Arc::new(MemorySource {
        json: Mutex::new(OFFICE_DOCUMENT.to_string()),
    });
    let handle = Arc::new(ModelHandle::empty());
    let (trigger, task) = ReloadService::new(source.clone(), handle.clone(), None).spawn();

    let outcome = trigger.reload().await.unwrap();
    assert_eq!(outcome.version, 1);
    assert_eq!(outcome.counts.credentials, 4);
    assert_eq!(handle.version(), 1);

    *source.json.lock().unwrap() = r#"{ "schedules": [{ "id": 1, "name": "bad",
        "timeframes": [{ "day": 1, "start": "18:00", "end": "06:00" }] }] }"#
        .to_string();
    let err = trigger.reload().await.unwrap_err();
    assert!(matches!(err, AppError::Model(_)));
    assert_eq!(handle.version(), 1);
    assert_eq!(handle.snapshot().counts().credentials, 4);

    drop(trigger);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("worker stops once triggers are dropped")
        .unwrap();
}

#[tokio::test]
async fn test_file_source_polling_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, r#"{ "groups": [{ "id": 1, "name": "first" }] }"#).unwrap();

    let handle = Arc::new(ModelHandle::empty());
    let source = Arc::new(FileModelSource::new(&path));
    let mut service = ReloadService::new(source, handle.clone(), Some(Duration::from_millis(20)));
    service.reload_now().await.unwrap();
    assert_eq!(handle.snapshot().counts().groups, 1);

    let (_trigger, _task) = service.spawn();

    // 部分文件系统的修改时间精度较粗
    tokio::time::sleep(Duration::from_millis(1100)).await;
    std::fs::write(
        &path,
        r#"{ "groups": [{ "id": 1, "name": "first" }, { "id": 2, "name": "second" }] }"#,
    )
    .unwrap();

    let mut reloaded = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if handle.snapshot().counts().groups == 2 {
            reloaded = true;
            break;
        }
    }
    assert!(reloaded, "polling should pick up the modified file");
    assert!(handle.version() >= 2);
}
