//! 访问审计服务
//!
//! 每次决策都会通知 [`AuditSink`]。默认实现 [`AuditService`] 输出结构化日志，
//! 并在内存中保留最近的若干条事件供运维查询。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use super::resolver::{Decision, DenyReason};
use crate::models::{CredentialId, ProfileSummary};

/// 决策结果接收方
///
/// 只做通知，决策引擎不依赖其结果。
pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        credential_id: Option<CredentialId>,
        target: Option<&str>,
        instant: NaiveDateTime,
        decision: &Decision,
    );
}

/// 一条访问事件
#[derive(Debug, Clone, Serialize)]
pub struct AccessEvent {
    pub id: Uuid,
    pub credential_id: Option<CredentialId>,
    pub target: Option<String>,
    /// 决策使用的现场本地时刻
    pub instant: NaiveDateTime,
    pub outcome: &'static str,
    pub reason: Option<DenyReason>,
    pub profile: Option<ProfileSummary>,
    pub recorded_at: DateTime<Utc>,
}

pub struct AuditService {
    capacity: usize,
    events: Mutex<VecDeque<AccessEvent>>,
}

impl AuditService {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 最近的事件，新的在前
    pub fn recent(&self, limit: usize) -> Vec<AccessEvent> {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, event: AccessEvent) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}

impl AuditSink for AuditService {
    fn record(
        &self,
        credential_id: Option<CredentialId>,
        target: Option<&str>,
        instant: NaiveDateTime,
        decision: &Decision,
    ) {
        let event = AccessEvent {
            id: Uuid::new_v4(),
            credential_id,
            target: target.map(str::to_string),
            instant,
            outcome: decision.outcome(),
            reason: decision.deny_reason(),
            profile: decision.profile().map(|p| p.summary()),
            recorded_at: Utc::now(),
        };

        tracing::info!(
            event_id = %event.id,
            credential_id = ?event.credential_id.map(|id| id.get()),
            target = event.target.as_deref().unwrap_or("-"),
            instant = %event.instant,
            outcome = event.outcome,
            reason = event.reason.map(|r| r.as_str()).unwrap_or("-"),
            "Access attempt"
        );

        self.push(event);
    }
}
