//! 授权映射（ScheduleMapping）
//! 把一个时间表绑定到一组目标（门/区域）和一组被授权者

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CredentialId, GrantId, GroupId, IdentityId, ScheduleId};

/// 授权映射
///
/// `targets` 为空表示不限目标。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    /// 非唯一的可选别名
    pub alias: String,
    pub schedule: ScheduleId,
    pub targets: BTreeSet<String>,
    pub identities: BTreeSet<IdentityId>,
    pub groups: BTreeSet<GroupId>,
    pub credentials: BTreeSet<CredentialId>,
}

impl Grant {
    pub fn new(id: GrantId, schedule: ScheduleId) -> Self {
        Self {
            id,
            alias: String::new(),
            schedule,
            targets: BTreeSet::new(),
            identities: BTreeSet::new(),
            groups: BTreeSet::new(),
            credentials: BTreeSet::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.insert(target.into());
        self
    }

    pub fn with_identity(mut self, id: IdentityId) -> Self {
        self.identities.insert(id);
        self
    }

    pub fn with_group(mut self, id: GroupId) -> Self {
        self.groups.insert(id);
        self
    }

    pub fn with_credential(mut self, id: CredentialId) -> Self {
        self.credentials.insert(id);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn has_identity(&self, id: IdentityId) -> bool {
        self.identities.contains(&id)
    }

    pub fn has_group(&self, id: GroupId) -> bool {
        self.groups.contains(&id)
    }

    pub fn has_credential(&self, id: CredentialId) -> bool {
        self.credentials.contains(&id)
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    /// 不再引用任何被授权者的映射对决策没有贡献
    pub fn has_no_grantee(&self) -> bool {
        self.identities.is_empty() && self.groups.is_empty() && self.credentials.is_empty()
    }
}
