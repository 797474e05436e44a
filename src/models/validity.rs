//! 有效性门控
//! 启用标志 + 可选日期范围，身份和凭证各自独立判定

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// 文本日期格式（日/月/年 时:分）
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// 有效性信息
///
/// 默认启用且不限日期范围，因此未配置的实体总是有效。
/// 字段私有，起始不晚于结束由 [`Validity::new`] 保证，反序列化也经过它。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ValidityRecord")]
pub struct Validity {
    enabled: bool,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

#[derive(Deserialize)]
struct ValidityRecord {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    start: Option<NaiveDateTime>,
    #[serde(default)]
    end: Option<NaiveDateTime>,
}

fn enabled_by_default() -> bool {
    true
}

impl TryFrom<ValidityRecord> for Validity {
    type Error = ModelError;

    fn try_from(record: ValidityRecord) -> Result<Self, Self::Error> {
        Self::new(record.enabled, record.start, record.end)
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self {
            enabled: true,
            start: None,
            end: None,
        }
    }
}

impl Validity {
    /// 创建有效性信息，拒绝起始晚于结束的范围
    pub fn new(
        enabled: bool,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Self, ModelError> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ModelError::InvalidValidity(format!(
                    "start {} is after end {}",
                    s.format(DATE_FORMAT),
                    e.format(DATE_FORMAT)
                )));
            }
        }
        Ok(Self {
            enabled,
            start,
            end,
        })
    }

    /// 已禁用的有效性信息
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// 从文本日期构建，空字符串表示不限
    pub fn from_dates(enabled: bool, start: &str, end: &str) -> Result<Self, ModelError> {
        Self::new(enabled, parse_date(start)?, parse_date(end)?)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    /// 时间点是否落在 [start, end] 内（两端包含）
    pub fn is_in_range(&self, now: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| now >= s) && self.end.map_or(true, |e| now <= e)
    }

    pub fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        self.is_enabled() && self.is_in_range(now)
    }
}

/// 解析 `dd/mm/YYYY HH:MM` 格式的日期
pub fn parse_date(s: &str) -> Result<Option<NaiveDateTime>, ModelError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|e| ModelError::InvalidDate(format!("{s}: {e}")))
}

/// 带有效性门控的实体
pub trait Validated {
    fn validity(&self) -> &Validity;

    /// 在给定时间点是否有效
    fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        self.validity().is_valid_at(now)
    }
}
