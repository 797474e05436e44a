//! 决策服务
//!
//! 入口处取一次模型快照，调用决策引擎，然后通知审计并记录指标。

use chrono::NaiveDateTime;
use std::sync::Arc;

use super::audit_service::AuditSink;
use super::model_handle::ModelHandle;
use super::resolver::{self, Decision, DenyReason};
use crate::models::{Credential, CredentialId, Presentation};
use crate::repository::Repository;

pub struct DecisionService {
    model: Arc<ModelHandle>,
    audit: Arc<dyn AuditSink>,
}

impl DecisionService {
    pub fn new(model: Arc<ModelHandle>, audit: Arc<dyn AuditSink>) -> Self {
        Self { model, audit }
    }

    /// 对读卡适配层给出的凭证做决策
    pub fn decide(
        &self,
        credential: &Credential,
        target: Option<&str>,
        instant: NaiveDateTime,
    ) -> Decision {
        let model = self.model.snapshot();
        let decision = resolver::decide(model.as_ref(), credential, target, instant);
        self.finish(Some(credential.id), target, instant, model.version(), decision)
    }

    /// 按凭证 ID 在当前模型中查找后决策；找不到时视为未知凭证
    pub fn decide_by_id(
        &self,
        credential_id: CredentialId,
        target: Option<&str>,
        instant: NaiveDateTime,
    ) -> Decision {
        let model = self.model.snapshot();
        let decision = match model.find_credential(credential_id) {
            Some(credential) => resolver::decide(model.as_ref(), credential, target, instant),
            None => Decision::Denied(DenyReason::UnknownCredential),
        };
        self.finish(Some(credential_id), target, instant, model.version(), decision)
    }

    /// 把卡号/PIN 映射为凭证后决策
    pub fn decide_presentation(
        &self,
        presentation: &Presentation,
        target: Option<&str>,
        instant: NaiveDateTime,
    ) -> Decision {
        let model = self.model.snapshot();
        let (credential_id, decision) = match model.find_credential_by_presentation(presentation) {
            Some(credential) => (
                Some(credential.id),
                resolver::decide(model.as_ref(), credential, target, instant),
            ),
            None => {
                tracing::debug!(key = %presentation.key(), "No credential matches presentation");
                (None, Decision::Denied(DenyReason::UnknownCredential))
            }
        };
        self.finish(credential_id, target, instant, model.version(), decision)
    }

    fn finish(
        &self,
        credential_id: Option<CredentialId>,
        target: Option<&str>,
        instant: NaiveDateTime,
        model_version: u64,
        decision: Decision,
    ) -> Decision {
        let reason = decision.deny_reason().map(|r| r.as_str()).unwrap_or("none");
        metrics::counter!(
            "access_decisions_total",
            "outcome" => decision.outcome(),
            "reason" => reason
        )
        .increment(1);

        tracing::debug!(
            credential_id = ?credential_id.map(|id| id.get()),
            target = target.unwrap_or("-"),
            model_version,
            outcome = decision.outcome(),
            reason,
            "Access decision"
        );

        self.audit.record(credential_id, target, instant, &decision);
        decision
    }
}
