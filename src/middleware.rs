//! HTTP 中间件
//! 应用状态与请求追踪

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::services::{AuditService, DecisionService, ModelHandle, ReloadTrigger};

/// 应用状态
///
/// 服务以 Arc 共享；模型句柄同时被决策服务和重载任务持有。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub model: Arc<ModelHandle>,
    pub decision_service: Arc<DecisionService>,
    pub audit_service: Arc<AuditService>,
    /// 没有启动重载任务时为 None
    pub reload_trigger: Option<ReloadTrigger>,
}

impl AppState {
    /// 以共享的模型句柄和审计服务组装状态
    pub fn new(
        config: AppConfig,
        model: Arc<ModelHandle>,
        audit_service: Arc<AuditService>,
        reload_trigger: Option<ReloadTrigger>,
    ) -> Self {
        let decision_service = Arc::new(DecisionService::new(model.clone(), audit_service.clone()));
        Self {
            config,
            model,
            decision_service,
            audit_service,
            reload_trigger,
        }
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();

        // 指标标签只使用静态字符串
        let status = response.status().as_u16();
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            _ => "OTHER",
        };
        let status_code = match status {
            200 => "200",
            400 => "400",
            404 => "404",
            422 => "422",
            500 => "500",
            503 => "503",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        // 在响应头中回传 trace_id / request_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
