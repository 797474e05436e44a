//! 凭证模型
//!
//! 凭证种类（卡、PIN、卡+PIN）是一个带标签的枚举。决策引擎只关心
//! 标识符、持有人和有效性；种类相关的载荷仅用于把读卡器上报的值映射回凭证。

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CredentialId, IdentityId, Validated, Validity};

/// 凭证种类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialKind {
    RfidCard { card_id: String, nb_bits: u32 },
    /// 只保存 PIN 的 SHA-256 摘要
    PinCode { pin_digest: String },
    CardPin {
        card_id: String,
        nb_bits: u32,
        pin_digest: String,
    },
}

impl CredentialKind {
    pub fn rfid_card(card_id: &str, nb_bits: u32) -> Self {
        CredentialKind::RfidCard {
            card_id: normalize_card_id(card_id),
            nb_bits,
        }
    }

    pub fn pin_code(pin: &str) -> Self {
        CredentialKind::PinCode {
            pin_digest: pin_digest(pin),
        }
    }

    pub fn card_pin(card_id: &str, nb_bits: u32, pin: &str) -> Self {
        CredentialKind::CardPin {
            card_id: normalize_card_id(card_id),
            nb_bits,
            pin_digest: pin_digest(pin),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::RfidCard { .. } => "rfid_card",
            CredentialKind::PinCode { .. } => "pin_code",
            CredentialKind::CardPin { .. } => "card_pin",
        }
    }

    /// 查找索引使用的键
    pub fn key(&self) -> CredentialKey {
        match self {
            CredentialKind::RfidCard { card_id, nb_bits } => CredentialKey::Card {
                card_id: card_id.clone(),
                nb_bits: *nb_bits,
            },
            CredentialKind::PinCode { pin_digest } => CredentialKey::Pin {
                pin_digest: pin_digest.clone(),
            },
            CredentialKind::CardPin {
                card_id,
                nb_bits,
                pin_digest,
            } => CredentialKey::CardPin {
                card_id: card_id.clone(),
                nb_bits: *nb_bits,
                pin_digest: pin_digest.clone(),
            },
        }
    }
}

/// 凭证查找键（规范化卡号 / PIN 摘要）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    Card {
        card_id: String,
        nb_bits: u32,
    },
    Pin {
        pin_digest: String,
    },
    CardPin {
        card_id: String,
        nb_bits: u32,
        pin_digest: String,
    },
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 不输出 PIN 摘要
        match self {
            CredentialKey::Card { card_id, nb_bits } => write!(f, "card {card_id}/{nb_bits}"),
            CredentialKey::Pin { .. } => write!(f, "pin"),
            CredentialKey::CardPin {
                card_id, nb_bits, ..
            } => write!(f, "card+pin {card_id}/{nb_bits}"),
        }
    }
}

/// 读卡器上报的原始出示值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Card { card_id: String, nb_bits: u32 },
    Pin { pin: String },
    CardAndPin {
        card_id: String,
        nb_bits: u32,
        pin: String,
    },
}

impl Presentation {
    pub fn key(&self) -> CredentialKey {
        match self {
            Presentation::Card { card_id, nb_bits } => CredentialKey::Card {
                card_id: normalize_card_id(card_id),
                nb_bits: *nb_bits,
            },
            Presentation::Pin { pin } => CredentialKey::Pin {
                pin_digest: pin_digest(pin),
            },
            Presentation::CardAndPin {
                card_id,
                nb_bits,
                pin,
            } => CredentialKey::CardPin {
                card_id: normalize_card_id(card_id),
                nb_bits: *nb_bits,
                pin_digest: pin_digest(pin),
            },
        }
    }
}

/// 凭证
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub alias: String,
    pub description: String,
    /// 持有人（独占，至多一个）
    pub owner: Option<IdentityId>,
    pub validity: Validity,
    pub kind: CredentialKind,
}

impl Credential {
    pub fn new(id: CredentialId, kind: CredentialKind) -> Self {
        Self {
            id,
            alias: String::new(),
            description: String::new(),
            owner: None,
            validity: Validity::default(),
            kind,
        }
    }

    pub fn with_owner(mut self, owner: IdentityId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }
}

impl Validated for Credential {
    fn validity(&self) -> &Validity {
        &self.validity
    }
}

/// 卡号统一为小写并去掉首尾空白
pub fn normalize_card_id(card_id: &str) -> String {
    card_id.trim().to_ascii_lowercase()
}

/// PIN 的 SHA-256 十六进制摘要
pub fn pin_digest(pin: &str) -> String {
    hex::encode(Sha256::digest(pin.as_bytes()))
}
