//! 档案构建
//!
//! 按被授权者种类（身份、用户组、凭证）收集引用它的授权映射，
//! 把每个映射的时间表放进档案：有目标的按目标各加一次，没有目标的加入默认列表。
//! 时间表无法解析的映射会被跳过并记录告警，决策仍然继续。

use crate::models::{CredentialId, GroupId, IdentityId, Profile};
use crate::repository::{GranteeRef, Repository};

/// 身份直接获得的档案
pub fn build_identity_profile<R: Repository + ?Sized>(repo: &R, identity: IdentityId) -> Profile {
    build_profile(repo, GranteeRef::Identity(identity))
}

/// 用户组获得的档案
pub fn build_group_profile<R: Repository + ?Sized>(repo: &R, group: GroupId) -> Profile {
    build_profile(repo, GranteeRef::Group(group))
}

/// 凭证直接获得的档案
pub fn build_credential_profile<R: Repository + ?Sized>(
    repo: &R,
    credential: CredentialId,
) -> Profile {
    build_profile(repo, GranteeRef::Credential(credential))
}

fn build_profile<R: Repository + ?Sized>(repo: &R, grantee: GranteeRef) -> Profile {
    let mut profile = Profile::new();

    for grant in repo.grants_for(grantee) {
        let Some(schedule) = repo.find_schedule(grant.schedule) else {
            tracing::warn!(
                grant_id = %grant.id,
                schedule_id = %grant.schedule,
                grantee = %grantee,
                "Skipping grant with dangling schedule reference"
            );
            continue;
        };

        if grant.is_unrestricted() {
            profile.add(None, schedule);
        } else {
            for target in &grant.targets {
                profile.add(Some(target.as_str()), schedule.clone());
            }
        }
    }

    tracing::trace!(grantee = %grantee, schedules = profile.schedule_count(), "Profile built");
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Grant, GrantId, Group, Identity, Schedule, ScheduleId, TimeFrame};
    use crate::repository::{AccessModel, ModelBuilder};

    fn model() -> AccessModel {
        let mut builder = ModelBuilder::new();
        builder
            .add_identity(Identity::new(IdentityId(1), "alice").unwrap())
            .unwrap()
            .add_group(Group::new(GroupId(10), "staff").unwrap())
            .unwrap()
            .add_schedule(
                Schedule::new(ScheduleId(100), "office")
                    .with_timeframe(TimeFrame::new(1, 9, 0, 17, 0).unwrap()),
            )
            .unwrap()
            .add_grant(
                Grant::new(GrantId(1), ScheduleId(100))
                    .with_identity(IdentityId(1))
                    .with_target("door-a")
                    .with_target("door-b"),
            )
            .unwrap()
            .add_grant(Grant::new(GrantId(2), ScheduleId(100)).with_group(GroupId(10)))
            .unwrap()
            .add_grant(Grant::new(GrantId(3), ScheduleId(404)).with_group(GroupId(10)))
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_targets_get_one_entry_each() {
        let profile = build_identity_profile(&model(), IdentityId(1));
        assert_eq!(profile.schedule_count(), 2);
        assert!(profile.default_schedules().is_empty());
        assert_eq!(profile.target_schedules("door-a").len(), 1);
        assert_eq!(profile.target_schedules("door-b").len(), 1);
    }

    #[test]
    fn test_dangling_schedule_is_skipped() {
        let profile = build_group_profile(&model(), GroupId(10));
        assert_eq!(profile.schedule_count(), 1);
        assert_eq!(profile.default_schedules().len(), 1);
    }

    #[test]
    fn test_no_grants_yields_empty_profile() {
        assert!(build_credential_profile(&model(), CredentialId(5)).is_empty());
    }
}
