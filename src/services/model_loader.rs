//! 模型加载
//! 把 JSON 模型文档转换为只读访问模型

use std::path::Path;

use crate::error::{AppError, ModelError};
use crate::models::document::{
    CredentialKindRecord, CredentialRecord, DayRecord, GrantRecord, IdentityRecord,
    ModelDocument, ScheduleRecord,
};
use crate::models::schedule::week_day_from_name;
use crate::models::{
    Credential, CredentialId, CredentialKind, Grant, GrantId, Group, GroupId, Identity, IdentityId,
    Schedule, ScheduleId, TimeFrame, Validity,
};
use crate::repository::{AccessModel, ModelBuilder};

/// 从 JSON 文本加载
pub fn load_from_str(json: &str) -> Result<AccessModel, AppError> {
    let document: ModelDocument = serde_json::from_str(json)?;
    Ok(build_model(document)?)
}

/// 从文件加载
pub async fn load_from_file(path: &Path) -> Result<AccessModel, AppError> {
    let json = tokio::fs::read_to_string(path).await?;
    let model = load_from_str(&json)?;
    tracing::debug!(path = %path.display(), "Model document parsed");
    Ok(model)
}

/// 依次加入用户组、身份（含成员关系）、时间表、凭证、授权映射
pub fn build_model(document: ModelDocument) -> Result<AccessModel, ModelError> {
    let mut builder = ModelBuilder::new();

    for record in document.groups {
        let mut group = Group::new(GroupId(record.id), &record.name)?;
        group.description = record.description;
        builder.add_group(group)?;
    }

    for record in document.identities {
        add_identity(&mut builder, record)?;
    }

    for record in document.schedules {
        builder.add_schedule(schedule_from_record(record)?)?;
    }

    for record in document.credentials {
        builder.add_credential(credential_from_record(record)?)?;
    }

    for record in document.grants {
        builder.add_grant(grant_from_record(record))?;
    }

    builder.build()
}

fn add_identity(builder: &mut ModelBuilder, record: IdentityRecord) -> Result<(), ModelError> {
    let id = IdentityId(record.id);
    let mut identity = Identity::new(id, &record.username)?.with_validity(Validity::from_dates(
        record.enabled,
        &record.valid_from,
        &record.valid_until,
    )?);
    identity.display_name = record.display_name;
    builder.add_identity(identity)?;

    for membership in record.groups {
        builder.add_membership(id, GroupId(membership.group), membership.rank)?;
    }
    Ok(())
}

fn schedule_from_record(record: ScheduleRecord) -> Result<Schedule, ModelError> {
    let mut schedule = Schedule::new(ScheduleId(record.id), record.name);
    schedule.description = record.description;

    for tf in record.timeframes {
        let day = match tf.day {
            DayRecord::Index(day) => day,
            DayRecord::Name(name) => week_day_from_name(&name).ok_or_else(|| {
                ModelError::InvalidTimeFrame(format!(
                    "schedule {}: unknown day name '{name}'",
                    record.id
                ))
            })?,
        };
        let frame = TimeFrame::parse(day, &tf.start, &tf.end).map_err(|e| match e {
            ModelError::InvalidTimeFrame(msg) => {
                ModelError::InvalidTimeFrame(format!("schedule {}: {msg}", record.id))
            }
            other => other,
        })?;
        schedule.add_timeframe(frame);
    }
    Ok(schedule)
}

fn credential_from_record(record: CredentialRecord) -> Result<Credential, ModelError> {
    let kind = match &record.kind {
        CredentialKindRecord::RfidCard { card_id, nb_bits } => {
            CredentialKind::rfid_card(card_id, *nb_bits)
        }
        CredentialKindRecord::PinCode { pin } => CredentialKind::pin_code(pin),
        CredentialKindRecord::CardPin {
            card_id,
            nb_bits,
            pin,
        } => CredentialKind::card_pin(card_id, *nb_bits, pin),
    };

    let mut credential = Credential::new(CredentialId(record.id), kind)
        .with_alias(record.alias)
        .with_validity(Validity::from_dates(
            record.enabled,
            &record.valid_from,
            &record.valid_until,
        )?);
    credential.description = record.description;
    credential.owner = record.owner.map(IdentityId);
    Ok(credential)
}

fn grant_from_record(record: GrantRecord) -> Grant {
    let mut grant = Grant::new(GrantId(record.id), ScheduleId(record.schedule));
    grant.alias = record.alias;
    grant.targets = record.targets.into_iter().collect();
    grant.identities = record.identities.into_iter().map(IdentityId).collect();
    grant.groups = record.groups.into_iter().map(GroupId).collect();
    grant.credentials = record.credentials.into_iter().map(CredentialId).collect();
    grant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;

    #[test]
    fn test_day_names_and_indexes() {
        let model = load_from_str(
            r#"{
                "schedules": [{
                    "id": 1,
                    "name": "mixed",
                    "timeframes": [
                        { "day": "monday", "start": "08:00", "end": "12:00" },
                        { "day": 0, "start": "10:00", "end": "11:00" }
                    ]
                }]
            }"#,
        )
        .unwrap();
        let schedule = model.find_schedule(ScheduleId(1)).unwrap();
        assert_eq!(schedule.timeframes.len(), 2);
        assert_eq!(schedule.timeframes[0].day(), 1);
        assert_eq!(schedule.timeframes[1].day(), 0);
    }

    #[test]
    fn test_unknown_day_name_rejected() {
        let err = load_from_str(
            r#"{ "schedules": [{ "id": 1, "name": "x",
                 "timeframes": [{ "day": "someday", "start": "08:00", "end": "09:00" }] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Model(ModelError::InvalidTimeFrame(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(load_from_str("{ not json"), Err(AppError::Json(_))));
    }
}
