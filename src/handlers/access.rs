//! 访问判定的 HTTP 处理器
//! 供读卡适配层和运维排查使用

use axum::{extract::State, response::IntoResponse, Json};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppError,
    middleware::AppState,
    models::{CredentialId, Presentation, ProfileSummary},
    services::{Decision, DenyReason},
};

#[derive(Debug, Deserialize)]
pub struct CheckAccessRequest {
    pub credential_id: u64,
    #[serde(default)]
    pub target: Option<String>,
    /// 现场本地时间 `YYYY-MM-DDTHH:MM[:SS]`，缺省为当前时间
    #[serde(default)]
    pub at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PresentRequest {
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub nb_bits: Option<u32>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub granted: bool,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
    pub target: Option<String>,
    pub at: NaiveDateTime,
}

impl DecisionResponse {
    fn new(decision: &Decision, target: Option<String>, at: NaiveDateTime) -> Self {
        Self {
            granted: decision.is_granted(),
            outcome: decision.outcome(),
            reason: decision.deny_reason(),
            profile: decision.profile().map(|p| p.summary()),
            target,
            at,
        }
    }
}

/// 解析请求中的时间，缺省使用现场本地时间
pub fn parse_instant(at: Option<&str>) -> Result<NaiveDateTime, AppError> {
    let Some(raw) = at else {
        return Ok(chrono::Local::now().naive_local());
    };
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid instant: {raw}")))
}

/// 按凭证 ID 判定
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckAccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let at = parse_instant(req.at.as_deref())?;

    let decision = state.decision_service.decide_by_id(
        CredentialId(req.credential_id),
        req.target.as_deref(),
        at,
    );

    Ok(Json(DecisionResponse::new(&decision, req.target, at)))
}

/// 按出示的卡号和/或 PIN 判定
pub async fn present_credential(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PresentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let at = parse_instant(req.at.as_deref())?;
    let presentation = presentation_from_request(&req)?;

    let decision =
        state
            .decision_service
            .decide_presentation(&presentation, req.target.as_deref(), at);

    Ok(Json(DecisionResponse::new(&decision, req.target, at)))
}

fn presentation_from_request(req: &PresentRequest) -> Result<Presentation, AppError> {
    let card = match (&req.card_id, req.nb_bits) {
        (Some(card_id), Some(nb_bits)) => Some((card_id.clone(), nb_bits)),
        (Some(_), None) => {
            return Err(AppError::BadRequest(
                "nb_bits is required with card_id".to_string(),
            ))
        }
        (None, _) => None,
    };

    match (card, &req.pin) {
        (Some((card_id, nb_bits)), Some(pin)) => Ok(Presentation::CardAndPin {
            card_id,
            nb_bits,
            pin: pin.clone(),
        }),
        (Some((card_id, nb_bits)), None) => Ok(Presentation::Card { card_id, nb_bits }),
        (None, Some(pin)) => Ok(Presentation::Pin { pin: pin.clone() }),
        (None, None) => Err(AppError::BadRequest(
            "card_id or pin is required".to_string(),
        )),
    }
}
