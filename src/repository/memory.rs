//! 内存访问模型
//!
//! 所有实体按整数 ID 存放在各自的表中，授权映射只保存 ID，不保存指针。
//! 构建时一次性生成两个索引：
//! - 被授权者 -> 授权映射（"哪些授权适用于我"）
//! - 时间表 -> 授权映射（正向引用）
//!
//! 模型构建完成后只读；管理操作通过 [`AccessModel::to_builder`] 生成新的模型实例，
//! 再由模型句柄整体替换。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use super::{GranteeRef, Repository};
use crate::error::ModelError;
use crate::models::{
    Credential, CredentialId, CredentialKey, Grant, GrantId, Group, GroupId, GroupMember,
    GroupMembership, GroupRank, Identity, IdentityId, Presentation, Schedule, ScheduleId,
};

/// 各类实体数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelCounts {
    pub identities: usize,
    pub groups: usize,
    pub credentials: usize,
    pub schedules: usize,
    pub grants: usize,
}

/// 只读访问模型
#[derive(Debug)]
pub struct AccessModel {
    version: u64,
    loaded_at: DateTime<Utc>,
    identities: HashMap<IdentityId, Identity>,
    groups: HashMap<GroupId, Group>,
    credentials: HashMap<CredentialId, Credential>,
    schedules: HashMap<ScheduleId, Arc<Schedule>>,
    grants: BTreeMap<GrantId, Grant>,
    grantee_index: HashMap<GranteeRef, Vec<GrantId>>,
    schedule_index: HashMap<ScheduleId, Vec<GrantId>>,
    credential_keys: HashMap<CredentialKey, CredentialId>,
}

impl AccessModel {
    /// 空模型（版本 0，表示尚未加载）
    pub fn empty() -> Self {
        Self {
            version: 0,
            loaded_at: Utc::now(),
            identities: HashMap::new(),
            groups: HashMap::new(),
            credentials: HashMap::new(),
            schedules: HashMap::new(),
            grants: BTreeMap::new(),
            grantee_index: HashMap::new(),
            schedule_index: HashMap::new(),
            credential_keys: HashMap::new(),
        }
    }

    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// 由模型句柄在替换时分配
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn assign_version(&mut self, version: u64) {
        self.version = version;
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn counts(&self) -> ModelCounts {
        ModelCounts {
            identities: self.identities.len(),
            groups: self.groups.len(),
            credentials: self.credentials.len(),
            schedules: self.schedules.len(),
            grants: self.grants.len(),
        }
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.identities.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn credentials(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.values()
    }

    pub fn grants(&self) -> impl Iterator<Item = &Grant> {
        self.grants.values()
    }

    pub fn find_grant(&self, id: GrantId) -> Option<&Grant> {
        self.grants.get(&id)
    }

    /// 绑定到某个时间表的所有授权映射
    pub fn grants_of_schedule(&self, schedule: ScheduleId) -> Vec<&Grant> {
        self.resolve_grant_ids(self.schedule_index.get(&schedule))
    }

    pub fn find_credential_by_key(&self, key: &CredentialKey) -> Option<&Credential> {
        self.credential_keys
            .get(key)
            .and_then(|id| self.credentials.get(id))
    }

    /// 把读卡器上报的值映射为模型中的凭证
    pub fn find_credential_by_presentation(&self, presentation: &Presentation) -> Option<&Credential> {
        self.find_credential_by_key(&presentation.key())
    }

    /// 以当前内容重新打开构建器，用于生成修改后的新模型
    pub fn to_builder(&self) -> ModelBuilder {
        ModelBuilder {
            identities: self
                .identities
                .iter()
                .map(|(id, i)| (*id, i.clone()))
                .collect(),
            groups: self.groups.iter().map(|(id, g)| (*id, g.clone())).collect(),
            credentials: self
                .credentials
                .iter()
                .map(|(id, c)| (*id, c.clone()))
                .collect(),
            schedules: self
                .schedules
                .iter()
                .map(|(id, s)| (*id, Schedule::clone(s)))
                .collect(),
            grants: self.grants.clone(),
        }
    }

    fn resolve_grant_ids(&self, ids: Option<&Vec<GrantId>>) -> Vec<&Grant> {
        ids.map(|ids| ids.iter().filter_map(|id| self.grants.get(id)).collect())
            .unwrap_or_default()
    }
}

impl Repository for AccessModel {
    fn find_identity(&self, id: IdentityId) -> Option<&Identity> {
        self.identities.get(&id)
    }

    fn find_group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    fn find_credential(&self, id: CredentialId) -> Option<&Credential> {
        self.credentials.get(&id)
    }

    fn find_schedule(&self, id: ScheduleId) -> Option<Arc<Schedule>> {
        self.schedules.get(&id).cloned()
    }

    fn grants_for(&self, grantee: GranteeRef) -> Vec<&Grant> {
        self.resolve_grant_ids(self.grantee_index.get(&grantee))
    }
}

/// 模型构建器
///
/// 供加载器和管理层使用。引用完整性在 `build()` 时检查；
/// 引用了不存在的时间表或被授权者的授权映射会被保留，由决策引擎跳过。
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    identities: BTreeMap<IdentityId, Identity>,
    groups: BTreeMap<GroupId, Group>,
    credentials: BTreeMap<CredentialId, Credential>,
    schedules: BTreeMap<ScheduleId, Schedule>,
    grants: BTreeMap<GrantId, Grant>,
}

fn insert_unique<K: Ord + Copy + Into<u64>, V>(
    map: &mut BTreeMap<K, V>,
    kind: &'static str,
    id: K,
    value: V,
) -> Result<(), ModelError> {
    if map.contains_key(&id) {
        return Err(ModelError::DuplicateId {
            kind,
            id: id.into(),
        });
    }
    map.insert(id, value);
    Ok(())
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_identity(&mut self, identity: Identity) -> Result<&mut Self, ModelError> {
        insert_unique(&mut self.identities, "identity", identity.id, identity)?;
        Ok(self)
    }

    pub fn add_group(&mut self, group: Group) -> Result<&mut Self, ModelError> {
        insert_unique(&mut self.groups, "group", group.id, group)?;
        Ok(self)
    }

    /// 添加成员关系，身份与用户组必须已经存在
    pub fn add_membership(
        &mut self,
        identity: IdentityId,
        group: GroupId,
        rank: GroupRank,
    ) -> Result<&mut Self, ModelError> {
        if !self.groups.contains_key(&group) {
            return Err(ModelError::UnknownReference {
                kind: "group",
                id: group.0,
                context: format!("membership of identity {identity}"),
            });
        }
        let entry = self
            .identities
            .get_mut(&identity)
            .ok_or_else(|| ModelError::UnknownReference {
                kind: "identity",
                id: identity.0,
                context: format!("membership of group {group}"),
            })?;
        match entry.memberships.iter_mut().find(|m| m.group == group) {
            Some(existing) => existing.rank = rank,
            None => entry.memberships.push(GroupMembership { group, rank }),
        }
        Ok(self)
    }

    pub fn add_credential(&mut self, credential: Credential) -> Result<&mut Self, ModelError> {
        insert_unique(&mut self.credentials, "credential", credential.id, credential)?;
        Ok(self)
    }

    pub fn add_schedule(&mut self, schedule: Schedule) -> Result<&mut Self, ModelError> {
        insert_unique(&mut self.schedules, "schedule", schedule.id, schedule)?;
        Ok(self)
    }

    pub fn add_grant(&mut self, grant: Grant) -> Result<&mut Self, ModelError> {
        insert_unique(&mut self.grants, "grant", grant.id, grant)?;
        Ok(self)
    }

    /// 删除身份：移除成员关系、解除凭证持有、从授权映射中剔除
    pub fn remove_identity(&mut self, id: IdentityId) -> Option<Identity> {
        let removed = self.identities.remove(&id)?;
        for group in self.groups.values_mut() {
            group.members.retain(|m| m.identity != id);
        }
        for credential in self.credentials.values_mut() {
            if credential.owner == Some(id) {
                credential.owner = None;
            }
        }
        for grant in self.grants.values_mut() {
            grant.identities.remove(&id);
        }
        Some(removed)
    }

    /// 删除用户组：从所有成员关系和授权映射中剔除
    pub fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let removed = self.groups.remove(&id)?;
        for identity in self.identities.values_mut() {
            identity.memberships.retain(|m| m.group != id);
        }
        for grant in self.grants.values_mut() {
            grant.groups.remove(&id);
        }
        Some(removed)
    }

    pub fn remove_credential(&mut self, id: CredentialId) -> Option<Credential> {
        let removed = self.credentials.remove(&id)?;
        for grant in self.grants.values_mut() {
            grant.credentials.remove(&id);
        }
        Some(removed)
    }

    /// 删除时间表，同时删除绑定到它的授权映射
    pub fn remove_schedule(&mut self, id: ScheduleId) -> Option<Schedule> {
        let removed = self.schedules.remove(&id)?;
        self.grants.retain(|_, grant| grant.schedule != id);
        Some(removed)
    }

    pub fn remove_grant(&mut self, id: GrantId) -> Option<Grant> {
        self.grants.remove(&id)
    }

    /// 检查引用完整性并生成只读模型
    pub fn build(self) -> Result<AccessModel, ModelError> {
        let ModelBuilder {
            mut identities,
            mut groups,
            credentials,
            schedules,
            grants,
        } = self;

        // 成员关系两侧取并集后对称回写
        let mut memberships: BTreeMap<(IdentityId, GroupId), GroupRank> = BTreeMap::new();
        for identity in identities.values() {
            for m in &identity.memberships {
                memberships.insert((identity.id, m.group), m.rank);
            }
        }
        for group in groups.values() {
            for m in &group.members {
                memberships.entry((m.identity, group.id)).or_insert(m.rank);
            }
        }
        for (identity, group) in memberships.keys() {
            if !identities.contains_key(identity) {
                return Err(ModelError::UnknownReference {
                    kind: "identity",
                    id: identity.0,
                    context: format!("group {group}"),
                });
            }
            if !groups.contains_key(group) {
                return Err(ModelError::UnknownReference {
                    kind: "group",
                    id: group.0,
                    context: format!("identity {identity}"),
                });
            }
        }
        for identity in identities.values_mut() {
            identity.memberships.clear();
            identity.credentials.clear();
        }
        for group in groups.values_mut() {
            group.members.clear();
        }
        for (&(identity, group), &rank) in &memberships {
            if let Some(i) = identities.get_mut(&identity) {
                i.memberships.push(GroupMembership { group, rank });
            }
            if let Some(g) = groups.get_mut(&group) {
                g.members.push(GroupMember { identity, rank });
            }
        }

        // 凭证持有人必须存在；同时回填身份一侧的凭证列表和查找键
        let mut credential_keys = HashMap::new();
        for credential in credentials.values() {
            if let Some(owner) = credential.owner {
                let identity =
                    identities
                        .get_mut(&owner)
                        .ok_or_else(|| ModelError::UnknownReference {
                            kind: "identity",
                            id: owner.0,
                            context: format!("credential {}", credential.id),
                        })?;
                identity.credentials.push(credential.id);
            }
            let key = credential.kind.key();
            if credential_keys.contains_key(&key) {
                return Err(ModelError::DuplicateCredentialKey(key.to_string()));
            }
            credential_keys.insert(key, credential.id);
        }

        let mut grantee_index: HashMap<GranteeRef, Vec<GrantId>> = HashMap::new();
        let mut schedule_index: HashMap<ScheduleId, Vec<GrantId>> = HashMap::new();
        for grant in grants.values() {
            schedule_index.entry(grant.schedule).or_default().push(grant.id);
            let grantees = grant
                .identities
                .iter()
                .map(|id| GranteeRef::Identity(*id))
                .chain(grant.groups.iter().map(|id| GranteeRef::Group(*id)))
                .chain(grant.credentials.iter().map(|id| GranteeRef::Credential(*id)));
            for grantee in grantees {
                grantee_index.entry(grantee).or_default().push(grant.id);
            }
            if !schedules.contains_key(&grant.schedule) {
                tracing::warn!(
                    grant_id = %grant.id,
                    schedule_id = %grant.schedule,
                    "Grant references a missing schedule"
                );
            }
        }

        let unreferenced: BTreeSet<_> = grants
            .values()
            .filter(|g| g.has_no_grantee())
            .map(|g| g.id)
            .collect();
        if !unreferenced.is_empty() {
            tracing::debug!(count = unreferenced.len(), "Grants without any grantee");
        }

        Ok(AccessModel {
            version: 0,
            loaded_at: Utc::now(),
            identities: identities.into_iter().collect(),
            groups: groups.into_iter().collect(),
            credentials: credentials.into_iter().collect(),
            schedules: schedules
                .into_iter()
                .map(|(id, s)| (id, Arc::new(s)))
                .collect(),
            grants,
            grantee_index,
            schedule_index,
            credential_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CredentialKind, TimeFrame};

    fn sample_builder() -> ModelBuilder {
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
            .add_credential(
                Credential::new(CredentialId(1000), CredentialKind::rfid_card("aa:bb", 32))
                    .with_owner(IdentityId(1)),
            )
            .unwrap()
            .add_grant(
                Grant::new(GrantId(1), ScheduleId(100))
                    .with_group(GroupId(10))
                    .with_target("front-door"),
            )
            .unwrap();
        builder
            .add_membership(IdentityId(1), GroupId(10), GroupRank::Member)
            .unwrap();
        builder
    }

    #[test]
    fn test_build_fills_back_references() {
        let model = sample_builder().build().unwrap();
        let alice = model.find_identity(IdentityId(1)).unwrap();
        assert_eq!(alice.credentials, vec![CredentialId(1000)]);
        assert!(alice.is_member_of(GroupId(10)));
        assert!(model.find_group(GroupId(10)).unwrap().has_member(IdentityId(1)));
        assert_eq!(model.grants_for(GranteeRef::Group(GroupId(10))).len(), 1);
        assert_eq!(model.grants_of_schedule(ScheduleId(100)).len(), 1);
        assert!(model.grants_for(GranteeRef::Identity(IdentityId(1))).is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut builder = sample_builder();
        let err = builder
            .add_identity(Identity::new(IdentityId(1), "bob").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateId {
                kind: "identity",
                id: 1
            }
        );
    }

    #[test]
    fn test_unknown_owner_rejected() {
        let mut builder = sample_builder();
        builder
            .add_credential(
                Credential::new(CredentialId(1001), CredentialKind::pin_code("1234"))
                    .with_owner(IdentityId(99)),
            )
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(ModelError::UnknownReference { kind: "identity", id: 99, .. })
        ));
    }

    #[test]
    fn test_membership_requires_group() {
        let mut builder = sample_builder();
        assert!(builder
            .add_membership(IdentityId(1), GroupId(77), GroupRank::Admin)
            .is_err());
    }

    #[test]
    fn test_duplicate_credential_key_rejected() {
        let mut builder = sample_builder();
        builder
            .add_credential(Credential::new(
                CredentialId(1001),
                CredentialKind::rfid_card("AA:BB", 32),
            ))
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(ModelError::DuplicateCredentialKey(_))
        ));
    }

    #[test]
    fn test_dangling_schedule_is_accepted() {
        let mut builder = sample_builder();
        builder
            .add_grant(Grant::new(GrantId(2), ScheduleId(999)).with_identity(IdentityId(1)))
            .unwrap();
        let model = builder.build().unwrap();
        assert_eq!(model.grants_for(GranteeRef::Identity(IdentityId(1))).len(), 1);
        assert!(model.find_schedule(ScheduleId(999)).is_none());
    }

    #[test]
    fn test_remove_group_cascades() {
        let model = sample_builder().build().unwrap();
        let mut builder = model.to_builder();
        assert!(builder.remove_group(GroupId(10)).is_some());
        let model = builder.build().unwrap();
        assert!(model.find_grant(GrantId(1)).unwrap().groups.is_empty());
        assert!(!model.find_identity(IdentityId(1)).unwrap().is_member_of(GroupId(10)));
        assert!(model.grants_for(GranteeRef::Group(GroupId(10))).is_empty());
    }

    #[test]
    fn test_remove_identity_disowns_credentials() {
        let mut builder = sample_builder();
        builder.remove_identity(IdentityId(1));
        let model = builder.build().unwrap();
        assert_eq!(model.find_credential(CredentialId(1000)).unwrap().owner, None);
        assert!(model.find_group(GroupId(10)).unwrap().members.is_empty());
    }

    #[test]
    fn test_remove_schedule_drops_its_grants() {
        let mut builder = sample_builder();
        builder.remove_schedule(ScheduleId(100));
        let model = builder.build().unwrap();
        assert_eq!(model.counts().grants, 0);
    }

    #[test]
    fn test_presentation_lookup() {
        let model = sample_builder().build().unwrap();
        let found = model.find_credential_by_presentation(&Presentation::Card {
            card_id: "AA:BB".to_string(),
            nb_bits: 32,
        });
        assert_eq!(found.map(|c| c.id), Some(CredentialId(1000)));
        assert!(model
            .find_credential_by_presentation(&Presentation::Pin {
                pin: "0000".to_string()
            })
            .is_none());
    }
}
