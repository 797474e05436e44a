//! 时间表模型
//! 一个时间表是按顺序排列的单日时间段集合

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::ScheduleId;
use crate::error::ModelError;

/// 单日时间段
///
/// `day` 取值 0..=6，0 表示周日。起止时间均包含，精度为分钟。
/// 反序列化同样经过 [`TimeFrame::new`] 的校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimeFrameRecord")]
pub struct TimeFrame {
    day: u8,
    start: (u8, u8),
    end: (u8, u8),
}

impl TimeFrame {
    /// 创建时间段
    ///
    /// 结束早于开始（跨夜）的时间段会被拒绝，跨夜访问需要拆成相邻两天的两个时间段。
    pub fn new(
        day: u8,
        start_hour: u8,
        start_min: u8,
        end_hour: u8,
        end_min: u8,
    ) -> Result<Self, ModelError> {
        if day > 6 {
            return Err(ModelError::InvalidTimeFrame(format!(
                "day {day} is out of range 0..=6"
            )));
        }
        for (h, m) in [(start_hour, start_min), (end_hour, end_min)] {
            if h > 23 || m > 59 {
                return Err(ModelError::InvalidTimeFrame(format!(
                    "{h:02}:{m:02} is not a valid time of day"
                )));
            }
        }
        if (end_hour, end_min) < (start_hour, start_min) {
            return Err(ModelError::InvalidTimeFrame(format!(
                "end {end_hour:02}:{end_min:02} is before start {start_hour:02}:{start_min:02}"
            )));
        }
        Ok(Self {
            day,
            start: (start_hour, start_min),
            end: (end_hour, end_min),
        })
    }

    /// 从 "HH:MM" 字符串创建
    pub fn parse(day: u8, start: &str, end: &str) -> Result<Self, ModelError> {
        let (sh, sm) = parse_time(start)?;
        let (eh, em) = parse_time(end)?;
        Self::new(day, sh, sm, eh, em)
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn start(&self) -> (u8, u8) {
        self.start
    }

    pub fn end(&self) -> (u8, u8) {
        self.end
    }

    /// 时间点是否落在该时间段内
    pub fn matches(&self, instant: NaiveDateTime) -> bool {
        if instant.weekday().num_days_from_sunday() != u32::from(self.day) {
            return false;
        }
        // 秒被截断，只比较时和分
        let hm = (instant.hour() as u8, instant.minute() as u8);
        self.start <= hm && hm <= self.end
    }
}

#[derive(Deserialize)]
struct TimeFrameRecord {
    day: u8,
    start: (u8, u8),
    end: (u8, u8),
}

impl TryFrom<TimeFrameRecord> for TimeFrame {
    type Error = ModelError;

    fn try_from(record: TimeFrameRecord) -> Result<Self, Self::Error> {
        let TimeFrameRecord { day, start, end } = record;
        Self::new(day, start.0, start.1, end.0, end.1)
    }
}

/// 解析 "HH:MM"
pub fn parse_time(s: &str) -> Result<(u8, u8), ModelError> {
    let invalid = || ModelError::InvalidTimeFrame(format!("time {s:?} is not HH:MM"));
    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
    let h = h.trim().parse::<u8>().map_err(|_| invalid())?;
    let m = m.trim().parse::<u8>().map_err(|_| invalid())?;
    Ok((h, m))
}

/// 英文星期名转换为 0..=6（0 为周日）
pub fn week_day_from_name(name: &str) -> Option<u8> {
    match name.to_ascii_lowercase().as_str() {
        "sunday" => Some(0),
        "monday" => Some(1),
        "tuesday" => Some(2),
        "wednesday" => Some(3),
        "thursday" => Some(4),
        "friday" => Some(5),
        "saturday" => Some(6),
        _ => None,
    }
}

/// 时间表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub description: String,
    pub timeframes: Vec<TimeFrame>,
}

impl Schedule {
    pub fn new(id: ScheduleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            timeframes: Vec::new(),
        }
    }

    pub fn with_timeframe(mut self, tf: TimeFrame) -> Self {
        self.add_timeframe(tf);
        self
    }

    pub fn add_timeframe(&mut self, tf: TimeFrame) {
        self.timeframes.push(tf);
    }

    /// 是否有任一时间段包含该时间点
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.timeframes.iter().any(|tf| tf.matches(instant))
    }

    pub fn is_empty(&self) -> bool {
        self.timeframes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-01-01 是周一
    fn monday(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_timeframe_bounds_inclusive() {
        let tf = TimeFrame::new(1, 9, 0, 17, 0).unwrap();
        assert!(tf.matches(monday(9, 0, 0)));
        assert!(tf.matches(monday(17, 0, 59)));
        assert!(!tf.matches(monday(8, 59, 59)));
        assert!(!tf.matches(monday(17, 1, 0)));
    }

    #[test]
    fn test_timeframe_day_must_match() {
        let tf = TimeFrame::new(2, 0, 0, 23, 59).unwrap();
        assert!(!tf.matches(monday(12, 0, 0)));
    }

    #[test]
    fn test_sunday_is_day_zero() {
        let sunday = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(TimeFrame::new(0, 0, 0, 23, 59).unwrap().matches(sunday));
    }

    #[test]
    fn test_overnight_timeframe_rejected() {
        assert!(matches!(
            TimeFrame::new(1, 22, 0, 6, 0),
            Err(ModelError::InvalidTimeFrame(_))
        ));
    }

    #[test]
    fn test_deserialize_goes_through_checks() {
        let overnight = r#"{"day":1,"start":[22,0],"end":[6,0]}"#;
        assert!(serde_json::from_str::<TimeFrame>(overnight).is_err());
        let bad_day = r#"{"day":9,"start":[8,0],"end":[9,0]}"#;
        assert!(serde_json::from_str::<TimeFrame>(bad_day).is_err());

        let tf: TimeFrame =
            serde_json::from_str(r#"{"day":1,"start":[9,0],"end":[17,0]}"#).unwrap();
        assert_eq!(tf, TimeFrame::new(1, 9, 0, 17, 0).unwrap());
        let json = serde_json::to_string(&tf).unwrap();
        assert_eq!(serde_json::from_str::<TimeFrame>(&json).unwrap(), tf);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(TimeFrame::new(7, 0, 0, 1, 0).is_err());
        assert!(TimeFrame::new(1, 24, 0, 23, 0).is_err());
        assert!(TimeFrame::new(1, 0, 60, 1, 0).is_err());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:05").unwrap(), (9, 5));
        assert_eq!(parse_time("9:5").unwrap(), (9, 5));
        assert!(parse_time("0905").is_err());
        assert!(parse_time("ab:cd").is_err());
    }

    #[test]
    fn test_week_day_names() {
        assert_eq!(week_day_from_name("Sunday"), Some(0));
        assert_eq!(week_day_from_name("saturday"), Some(6));
        assert_eq!(week_day_from_name("someday"), None);
    }

    #[test]
    fn test_schedule_contains_any_frame() {
        let sched = Schedule::new(ScheduleId(1), "office")
            .with_timeframe(TimeFrame::new(1, 8, 0, 12, 0).unwrap())
            .with_timeframe(TimeFrame::new(1, 14, 0, 18, 0).unwrap());
        assert!(sched.contains(monday(9, 0, 0)));
        assert!(sched.contains(monday(15, 30, 0)));
        assert!(!sched.contains(monday(13, 0, 0)));
        assert!(!sched.is_empty());
        assert!(Schedule::new(ScheduleId(2), "never").is_empty());
    }
}
