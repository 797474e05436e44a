//! 模型状态与重载的 HTTP 处理器

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::{error::AppError, middleware::AppState, repository::ModelCounts};

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    pub counts: ModelCounts,
}

/// 当前生效模型的版本、加载时间和实体数量
pub async fn get_model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let model = state.model.snapshot();
    Json(ModelInfoResponse {
        version: model.version(),
        loaded_at: model.loaded_at(),
        counts: model.counts(),
    })
}

/// 立即重载模型
pub async fn reload_model(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let trigger = state
        .reload_trigger
        .as_ref()
        .ok_or(AppError::ReloadUnavailable)?;

    let outcome = trigger.reload().await?;

    tracing::info!(
        version = outcome.version,
        duration_ms = outcome.duration_ms,
        "Model reloaded by operator"
    );

    Ok(Json(outcome))
}
