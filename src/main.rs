//! 门禁访问控制服务主入口

use access_system::{
    config::AppConfig,
    handlers::health,
    middleware::AppState,
    routes,
    services::{AuditService, FileModelSource, ModelHandle, ReloadService},
    telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("access-system {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(env) = std::env::var("ACS_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志与指标
    telemetry::init_telemetry(&config.logging);
    telemetry::init_metrics();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Access system starting...");

    // 3. 首次加载访问模型；失败时以空模型启动，就绪探针保持未就绪
    let model = Arc::new(ModelHandle::empty());
    let source = Arc::new(FileModelSource::new(config.model.path.clone()));
    let mut reload_service =
        ReloadService::new(source, model.clone(), config.model.poll_interval());

    match reload_service.reload_now().await {
        Ok(outcome) => tracing::info!(
            version = outcome.version,
            path = %config.model.path.display(),
            duration_ms = outcome.duration_ms,
            "Initial access model loaded"
        ),
        Err(e) => tracing::error!(
            path = %config.model.path.display(),
            error = %e,
            "Initial access model load failed, serving with an empty model"
        ),
    }

    // 4. 启动重载任务
    let (reload_trigger, reload_task) = reload_service.spawn();

    // 5. 构建应用状态
    let audit_service = Arc::new(AuditService::new(config.audit.capacity));
    let app_state = Arc::new(AppState::new(
        config.clone(),
        model,
        audit_service,
        Some(reload_trigger),
    ));

    // 6. 构建路由
    let app = routes::create_router(app_state.clone());

    // 7. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. 停止重载任务：丢弃最后一个触发句柄后任务自行退出
    drop(app_state);
    let timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    if tokio::time::timeout(timeout, reload_task).await.is_err() {
        tracing::warn!("Reload worker did not stop before timeout");
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("access-system {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: access-system [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量（前缀 ACS_，层级分隔符 __）:");
    println!("  ACS_SERVER__ADDR                 监听地址");
    println!("  ACS_LOGGING__LEVEL               日志级别");
    println!("  ACS_LOGGING__FORMAT              json 或 pretty");
    println!("  ACS_MODEL__PATH                  模型文档路径");
    println!("  ACS_MODEL__RELOAD_POLL_SECS      文件检查间隔，0 为关闭");
    println!("  ACS_AUDIT__CAPACITY              内存审计事件条数");
}
