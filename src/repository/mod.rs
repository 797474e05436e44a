//! 模型访问层
//!
//! 决策引擎只通过 [`Repository`] 读取身份、用户组、凭证、时间表与授权映射；
//! 内存实现见 [`memory::AccessModel`]。

pub mod memory;

pub use memory::{AccessModel, ModelBuilder, ModelCounts};

use std::sync::Arc;

use crate::models::{
    Credential, CredentialId, Grant, Group, GroupId, Identity, IdentityId, Schedule, ScheduleId,
};

/// 被授权者引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GranteeRef {
    Identity(IdentityId),
    Group(GroupId),
    Credential(CredentialId),
}

impl std::fmt::Display for GranteeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GranteeRef::Identity(id) => write!(f, "identity {id}"),
            GranteeRef::Group(id) => write!(f, "group {id}"),
            GranteeRef::Credential(id) => write!(f, "credential {id}"),
        }
    }
}

/// 只读模型访问接口
pub trait Repository {
    fn find_identity(&self, id: IdentityId) -> Option<&Identity>;

    fn find_group(&self, id: GroupId) -> Option<&Group>;

    fn find_credential(&self, id: CredentialId) -> Option<&Credential>;

    /// 时间表以共享引用返回，档案可以在模型替换后继续持有
    fn find_schedule(&self, id: ScheduleId) -> Option<Arc<Schedule>>;

    /// 所有直接引用该被授权者的授权映射
    fn grants_for(&self, grantee: GranteeRef) -> Vec<&Grant>;
}
