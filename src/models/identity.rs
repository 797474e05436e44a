//! 身份（用户）模型

use serde::{Deserialize, Serialize};

use super::{CredentialId, GroupId, GroupRank, IdentityId, Validated, Validity};
use crate::error::ModelError;

/// 身份所属用户组（身份一侧的成员关系）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group: GroupId,
    pub rank: GroupRank,
}

/// 身份
///
/// 只能经由 [`Identity::new`] 创建，用户名总是规范化后的形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: IdentityId,
    username: String,
    pub display_name: Option<String>,
    pub validity: Validity,
    pub memberships: Vec<GroupMembership>,
    /// 由模型构建器根据凭证的 owner 回填
    pub credentials: Vec<CredentialId>,
}

impl Identity {
    /// 创建身份，用户名统一转为小写
    pub fn new(id: IdentityId, username: &str) -> Result<Self, ModelError> {
        Ok(Self {
            id,
            username: normalize_username(username)?,
            display_name: None,
            validity: Validity::default(),
            memberships: Vec::new(),
            credentials: Vec::new(),
        })
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.memberships.iter().map(|m| m.group)
    }

    pub fn is_member_of(&self, group: GroupId) -> bool {
        self.memberships.iter().any(|m| m.group == group)
    }
}

impl Validated for Identity {
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

fn is_valid_username_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
}

/// 校验并规范化用户名
pub fn normalize_username(username: &str) -> Result<String, ModelError> {
    if username.is_empty() || !username.chars().all(is_valid_username_character) {
        return Err(ModelError::InvalidName(format!(
            "invalid username: {{{username}}}"
        )));
    }
    Ok(username.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_lowercased() {
        let identity = Identity::new(IdentityId(1), "John.Doe").unwrap();
        assert_eq!(identity.username(), "john.doe");
    }

    #[test]
    fn test_username_invalid_characters() {
        assert!(Identity::new(IdentityId(1), "john doe").is_err());
        assert!(Identity::new(IdentityId(1), "jöhn").is_err());
        assert!(Identity::new(IdentityId(1), "").is_err());
        assert!(Identity::new(IdentityId(1), "a_b-c.d9").is_ok());
    }

    #[test]
    fn test_default_identity_is_valid() {
        let identity = Identity::new(IdentityId(1), "toto").unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(identity.is_valid_at(now));
        assert!(!identity
            .with_validity(Validity::disabled())
            .is_valid_at(now));
    }
}
