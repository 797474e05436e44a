//! 用户组模型

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{GroupId, IdentityId};
use crate::error::ModelError;

static GROUP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,50}$").expect("group name pattern is valid"));

/// 组内等级
///
/// 只供管理权限使用，物理访问决策不读取该字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRank {
    Admin,
    Operator,
    #[default]
    Member,
}

impl GroupRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRank::Admin => "admin",
            GroupRank::Operator => "operator",
            GroupRank::Member => "member",
        }
    }
}

/// 组成员（用户组一侧的成员关系）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub identity: IdentityId,
    pub rank: GroupRank,
}

/// 用户组
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    name: String,
    pub description: String,
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn new(id: GroupId, name: &str) -> Result<Self, ModelError> {
        validate_group_name(name)?;
        Ok(Self {
            id,
            name: name.to_string(),
            description: String::new(),
            members: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_member(&self, identity: IdentityId) -> bool {
        self.members.iter().any(|m| m.identity == identity)
    }
}

/// 组名：3 到 50 个字符，仅限字母、数字、`.`、`_`、`-`
pub fn validate_group_name(name: &str) -> Result<(), ModelError> {
    if !GROUP_NAME_RE.is_match(name) {
        return Err(ModelError::InvalidName(format!(
            "group name {name:?} must be 3-50 characters of [A-Za-z0-9._-]"
        )));
    }
    Ok(())
}
