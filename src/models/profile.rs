//! 访问档案
//!
//! 一次决策时解析出的视图：默认时间表（对任何目标都生效）加上按目标名分组的时间表。
//! 档案持有共享的 `Arc<Schedule>`，在模型被替换后仍可用于审计。

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{Schedule, ScheduleId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    defaults: Vec<Arc<Schedule>>,
    by_target: HashMap<String, Vec<Arc<Schedule>>>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加时间表；没有目标时加入默认列表
    pub fn add(&mut self, target: Option<&str>, schedule: Arc<Schedule>) {
        match target {
            None => self.defaults.push(schedule),
            Some(name) => self
                .by_target
                .entry(name.to_string())
                .or_default()
                .push(schedule),
        }
    }

    /// 默认时间表任一命中即放行；指定目标时再检查该目标的时间表
    pub fn is_access_granted(&self, instant: NaiveDateTime, target: Option<&str>) -> bool {
        if self.defaults.iter().any(|s| s.contains(instant)) {
            return true;
        }
        target
            .and_then(|name| self.by_target.get(name))
            .is_some_and(|schedules| schedules.iter().any(|s| s.contains(instant)))
    }

    /// 持有的时间表引用总数（默认 + 所有目标）
    pub fn schedule_count(&self) -> usize {
        self.defaults.len() + self.by_target.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule_count() == 0
    }

    pub fn default_schedules(&self) -> &[Arc<Schedule>] {
        &self.defaults
    }

    pub fn target_schedules(&self, target: &str) -> &[Arc<Schedule>] {
        self.by_target
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.by_target.keys().map(String::as_str)
    }

    /// 拆出内部列表，供合并使用
    pub(crate) fn into_parts(self) -> (Vec<Arc<Schedule>>, HashMap<String, Vec<Arc<Schedule>>>) {
        (self.defaults, self.by_target)
    }

    pub(crate) fn from_parts(
        defaults: Vec<Arc<Schedule>>,
        by_target: HashMap<String, Vec<Arc<Schedule>>>,
    ) -> Self {
        Self {
            defaults,
            by_target,
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            default_schedules: self.defaults.iter().map(|s| s.id).collect(),
            targets: self
                .by_target
                .iter()
                .map(|(name, list)| (name.clone(), list.iter().map(|s| s.id).collect()))
                .collect(),
        }
    }
}

/// 档案摘要（只包含时间表 ID），用于审计与 HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub default_schedules: Vec<ScheduleId>,
    pub targets: BTreeMap<String, Vec<ScheduleId>>,
}
