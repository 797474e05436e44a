//! 测试公共模块
//! 提供测试配置、模型夹具和应用状态

#![allow(dead_code)]

use access_system::{
    config::{AppConfig, AuditConfig, LoggingConfig, ModelConfig, ServerConfig},
    middleware::AppState,
    models::{
        Credential, CredentialId, CredentialKind, Grant, GrantId, Group, GroupId, GroupRank,
        Identity, IdentityId, Schedule, ScheduleId, TimeFrame, Validity,
    },
    repository::{AccessModel, ModelBuilder},
    services::{AuditService, ModelHandle, ReloadTrigger},
};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        model: ModelConfig {
            path: "access-model.json".into(),
            reload_poll_secs: 0,
        },
        audit: AuditConfig { capacity: 100 },
    }
}

/// 2024 年 1 月的某一天（1 日是周一）的指定时刻
pub fn jan_2024(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn monday(hour: u32, minute: u32) -> NaiveDateTime {
    jan_2024(1, hour, minute)
}

pub fn tuesday(hour: u32, minute: u32) -> NaiveDateTime {
    jan_2024(2, hour, minute)
}

/// 单一时间段的时间表；day 为 0..=6（0 为周日）
pub fn schedule(id: u64, day: u8, start_hour: u8, end_hour: u8) -> Schedule {
    Schedule::new(ScheduleId(id), format!("schedule-{id}"))
        .with_timeframe(TimeFrame::new(day, start_hour, 0, end_hour, 0).unwrap())
}

pub fn identity(id: u64, username: &str) -> Identity {
    Identity::new(IdentityId(id), username).unwrap()
}

pub fn group(id: u64, name: &str) -> Group {
    Group::new(GroupId(id), name).unwrap()
}

pub fn card(id: u64, card_id: &str, owner: Option<u64>) -> Credential {
    let credential = Credential::new(CredentialId(id), CredentialKind::rfid_card(card_id, 26));
    match owner {
        Some(owner) => credential.with_owner(IdentityId(owner)),
        None => credential,
    }
}

/// 办公室场景：
/// - alice（1）持卡 100，属于 staff（10）
/// - bob（2）已禁用，持卡 101
/// - staff 在周一 09:00-17:00 不限目标
/// - 访客卡 102 无持有人，周二 08:00-12:00 仅限 lobby
pub fn office_model() -> AccessModel {
    let mut builder = ModelBuilder::new();
    builder
        .add_group(group(10, "staff"))
        .unwrap()
        .add_identity(identity(1, "alice"))
        .unwrap()
        .add_identity(identity(2, "bob").with_validity(Validity::disabled()))
        .unwrap()
        .add_schedule(schedule(1, 1, 9, 17))
        .unwrap()
        .add_schedule(schedule(2, 2, 8, 12))
        .unwrap()
        .add_credential(card(100, "00:00:01", Some(1)))
        .unwrap()
        .add_credential(card(101, "00:00:02", Some(2)))
        .unwrap()
        .add_credential(card(102, "00:00:03", None))
        .unwrap()
        .add_grant(Grant::new(GrantId(1), ScheduleId(1)).with_group(GroupId(10)))
        .unwrap()
        .add_grant(Grant::new(GrantId(2), ScheduleId(1)).with_identity(IdentityId(2)))
        .unwrap()
        .add_grant(
            Grant::new(GrantId(3), ScheduleId(2))
                .with_credential(CredentialId(102))
                .with_target("lobby"),
        )
        .unwrap();
    builder
        .add_membership(IdentityId(1), GroupId(10), GroupRank::Member)
        .unwrap();
    builder.build().unwrap()
}

/// 与 [`office_model`] 等价的 JSON 文档
pub const OFFICE_DOCUMENT: &str = r#"{
    "groups": [
        { "id": 10, "name": "staff" }
    ],
    "identities": [
        { "id": 1, "username": "Alice", "groups": [{ "group": 10, "rank": "member" }] },
        { "id": 2, "username": "bob", "enabled": false }
    ],
    "schedules": [
        { "id": 1, "name": "office-hours",
          "timeframes": [{ "day": "monday", "start": "09:00", "end": "17:00" }] },
        { "id": 2, "name": "visitor",
          "timeframes": [{ "day": 2, "start": "08:00", "end": "12:00" }] }
    ],
    "credentials": [
        { "id": 100, "type": "rfid_card", "card_id": "00:00:01", "nb_bits": 26, "owner": 1 },
        { "id": 101, "type": "rfid_card", "card_id": "00:00:02", "nb_bits": 26, "owner": 2 },
        { "id": 102, "type": "rfid_card", "card_id": "00:00:03", "nb_bits": 26 },
        { "id": 103, "type": "pin_code", "pin": "2468", "owner": 1,
          "valid_from": "01/01/2024 00:00", "valid_until": "31/01/2024 23:59" }
    ],
    "grants": [
        { "id": 1, "schedule": 1, "groups": [10] },
        { "id": 2, "schedule": 1, "identities": [2] },
        { "id": 3, "schedule": 2, "credentials": [102], "targets": ["lobby"] }
    ]
}"#;

/// 创建测试应用状态
pub fn create_test_app_state(
    model: AccessModel,
    reload_trigger: Option<ReloadTrigger>,
) -> Arc<AppState> {
    let config = create_test_config();
    let handle = Arc::new(ModelHandle::new(model));
    let audit_service = Arc::new(AuditService::new(config.audit.capacity));
    Arc::new(AppState::new(config, handle, audit_service, reload_trigger))
}
