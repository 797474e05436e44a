//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// 请求体上限（访问判定请求都很小）
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 访问判定
    let access_routes = Router::new()
        .route("/api/v1/access/check", post(handlers::access::check_access))
        .route(
            "/api/v1/access/present",
            post(handlers::access::present_credential),
        );

    // 模型与审计（运维）
    let operator_routes = Router::new()
        .route("/api/v1/model", get(handlers::model::get_model_info))
        .route("/api/v1/model/reload", post(handlers::model::reload_model))
        .route("/api/v1/audit", get(handlers::audit::list_access_events));

    Router::new()
        .merge(public_routes)
        .merge(access_routes)
        .merge(operator_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
