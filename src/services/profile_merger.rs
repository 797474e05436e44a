//! 档案合并
//! 默认列表和各目标列表直接拼接，不去重；判定只需要"任一命中"

use crate::models::Profile;

pub fn merge(a: Profile, b: Profile) -> Profile {
    let (mut defaults, mut by_target) = a.into_parts();
    let (other_defaults, other_targets) = b.into_parts();

    defaults.extend(other_defaults);
    for (target, schedules) in other_targets {
        by_target.entry(target).or_default().extend(schedules);
    }

    Profile::from_parts(defaults, by_target)
}

/// 从空档案开始依次合并
pub fn merge_all<I>(profiles: I) -> Profile
where
    I: IntoIterator<Item = Profile>,
{
    profiles.into_iter().fold(Profile::new(), merge)
}
