//! 模型文档记录
//! 加载器读取的纯值记录（标识符 + 属性），与引擎内部结构解耦

use serde::{Deserialize, Serialize};

use super::GroupRank;

/// 完整的模型文档
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub identities: Vec<IdentityRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub credentials: Vec<CredentialRecord>,
    #[serde(default)]
    pub schedules: Vec<ScheduleRecord>,
    #[serde(default)]
    pub grants: Vec<GrantRecord>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// `dd/mm/YYYY HH:MM`，空字符串表示不限
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_until: String,
    #[serde(default)]
    pub groups: Vec<MembershipRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub group: u64,
    #[serde(default)]
    pub rank: GroupRank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: u64,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_until: String,
    #[serde(flatten)]
    pub kind: CredentialKindRecord,
}

/// 凭证种类记录，PIN 以明文出现在文档中，加载时转换为摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialKindRecord {
    RfidCard {
        card_id: String,
        nb_bits: u32,
    },
    PinCode {
        pin: String,
    },
    CardPin {
        card_id: String,
        nb_bits: u32,
        pin: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timeframes: Vec<TimeFrameRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFrameRecord {
    pub day: DayRecord,
    /// "HH:MM"
    pub start: String,
    pub end: String,
}

/// 星期：0..=6 的整数或英文名称
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayRecord {
    Index(u8),
    Name(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantRecord {
    pub id: u64,
    #[serde(default)]
    pub alias: String,
    pub schedule: u64,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub identities: Vec<u64>,
    #[serde(default)]
    pub groups: Vec<u64>,
    #[serde(default)]
    pub credentials: Vec<u64>,
}
