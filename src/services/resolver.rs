//! 访问决策引擎
//!
//! 纯函数：给定模型、凭证、目标和时刻，返回决策值。
//! 拒绝是结果而不是错误；模型中的悬空引用只会降级，不会中断决策。

use chrono::NaiveDateTime;
use serde::Serialize;

use super::profile_builder::{build_credential_profile, build_group_profile, build_identity_profile};
use super::profile_merger::merge_all;
use crate::models::{Credential, Profile, Validated};
use crate::repository::Repository;

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// 凭证被禁用或不在有效期内
    CredentialInvalid,
    /// 持有人被禁用、不在有效期内或在模型中不存在
    OwnerInvalid,
    /// 没有任何授权映射适用
    NoApplicableGrant,
    /// 有授权映射，但当前时刻不在时间表内
    OutsideSchedule,
    /// 出示的卡号或 PIN 没有对应的凭证
    UnknownCredential,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::CredentialInvalid => "credential_invalid",
            DenyReason::OwnerInvalid => "owner_invalid",
            DenyReason::NoApplicableGrant => "no_applicable_grant",
            DenyReason::OutsideSchedule => "outside_schedule",
            DenyReason::UnknownCredential => "unknown_credential",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 决策结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Granted(Profile),
    Denied(DenyReason),
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Granted(_) => None,
            Decision::Denied(reason) => Some(*reason),
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Decision::Granted(profile) => Some(profile),
            Decision::Denied(_) => None,
        }
    }

    pub fn outcome(&self) -> &'static str {
        if self.is_granted() {
            "granted"
        } else {
            "denied"
        }
    }
}

/// 判定凭证在给定时刻能否进入目标
///
/// `target` 为 `None` 时只检查默认时间表。
pub fn decide<R: Repository + ?Sized>(
    repo: &R,
    credential: &Credential,
    target: Option<&str>,
    instant: NaiveDateTime,
) -> Decision {
    if !credential.is_valid_at(instant) {
        return Decision::Denied(DenyReason::CredentialInvalid);
    }

    let mut profiles = Vec::new();

    if let Some(owner_id) = credential.owner {
        let Some(owner) = repo.find_identity(owner_id) else {
            tracing::warn!(
                credential_id = %credential.id,
                owner_id = %owner_id,
                "Credential owner missing from model"
            );
            return Decision::Denied(DenyReason::OwnerInvalid);
        };
        if !owner.is_valid_at(instant) {
            return Decision::Denied(DenyReason::OwnerInvalid);
        }

        profiles.push(build_identity_profile(repo, owner_id));
        for group in owner.group_ids() {
            profiles.push(build_group_profile(repo, group));
        }
    }
    profiles.push(build_credential_profile(repo, credential.id));

    let merged = merge_all(profiles);
    if merged.schedule_count() == 0 {
        return Decision::Denied(DenyReason::NoApplicableGrant);
    }

    if merged.is_access_granted(instant, target) {
        Decision::Granted(merged)
    } else {
        Decision::Denied(DenyReason::OutsideSchedule)
    }
}
