//! 访问审计查询

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::middleware::AppState;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// 最近的访问事件，新的在前
pub async fn list_access_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Json<Value> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIMIT)
        .min(state.audit_service.capacity());
    let events = state.audit_service.recent(limit);

    Json(json!({
        "events": events,
        "count": events.len()
    }))
}
