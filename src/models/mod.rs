//! 数据模型模块
//! 身份、用户组、凭证、时间表与授权映射，以及决策时使用的访问档案

pub mod credential;
pub mod document;
pub mod grant;
pub mod group;
pub mod identity;
pub mod profile;
pub mod schedule;
pub mod validity;

pub use credential::{Credential, CredentialKey, CredentialKind, Presentation};
pub use grant::Grant;
pub use group::{Group, GroupMember, GroupRank};
pub use identity::{GroupMembership, Identity};
pub use profile::{Profile, ProfileSummary};
pub use schedule::{Schedule, TimeFrame};
pub use validity::{Validated, Validity};

/// 定义基于整数的实体标识符
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// 身份（用户）标识符
    IdentityId
);
define_id!(
    /// 用户组标识符
    GroupId
);
define_id!(
    /// 凭证标识符
    CredentialId
);
define_id!(
    /// 时间表标识符
    ScheduleId
);
define_id!(
    /// 授权映射标识符
    GrantId
);
