//! 配置系统
//! 从环境变量加载所有配置（前缀 ACS_），启动时统一校验

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// 模型文档路径（JSON）
    pub path: PathBuf,
    /// 检查文件修改的间隔（秒），0 表示只在运维请求时重载
    pub reload_poll_secs: u64,
}

impl ModelConfig {
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.reload_poll_secs > 0).then(|| Duration::from_secs(self.reload_poll_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// 内存中保留的访问事件条数
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub model: ModelConfig,
    pub audit: AuditConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("model.path", "access-model.json")?
            .set_default("model.reload_poll_secs", 0)?
            .set_default("audit.capacity", 1000)?;

        // 从环境变量加载配置（前缀为 ACS_）
        settings = settings.add_source(
            Environment::with_prefix("ACS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.model.path.as_os_str().is_empty() {
            return Err(ConfigError::Message("model.path must not be empty".to_string()));
        }

        if self.model.reload_poll_secs > 86400 {
            return Err(ConfigError::Message(
                "reload_poll_secs must be between 0 and 86400".to_string(),
            ));
        }

        if self.audit.capacity > 1_000_000 {
            return Err(ConfigError::Message(
                "audit capacity must not exceed 1000000".to_string(),
            ));
        }

        Ok(())
    }
}
