//! 模型重载服务
//!
//! 在后台任务中加载新模型并整体替换当前模型，热路径上的决策不受影响。
//! 触发方式：
//! - 运维请求（[`ReloadTrigger::reload`]，通过 mpsc 发送、oneshot 回复结果）
//! - 定期检查模型来源是否变化（文件修改时间）
//!
//! 加载失败时保留当前模型，只报告错误。

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::model_handle::ModelHandle;
use super::model_loader;
use crate::error::AppError;
use crate::repository::{AccessModel, ModelCounts};

/// 模型来源
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// 构建一个完整的新模型
    async fn load(&self) -> Result<AccessModel, AppError>;

    /// 来源在 `since` 之后发生变化时返回新的时间戳；不支持变化检测的来源返回 `None`
    async fn changed_since(
        &self,
        _since: Option<SystemTime>,
    ) -> Result<Option<SystemTime>, AppError> {
        Ok(None)
    }

    fn describe(&self) -> String;
}

/// 基于 JSON 文件的模型来源
pub struct FileModelSource {
    path: PathBuf,
}

impl FileModelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModelSource for FileModelSource {
    async fn load(&self) -> Result<AccessModel, AppError> {
        model_loader::load_from_file(&self.path).await
    }

    async fn changed_since(
        &self,
        since: Option<SystemTime>,
    ) -> Result<Option<SystemTime>, AppError> {
        let modified = tokio::fs::metadata(&self.path).await?.modified()?;
        Ok((since != Some(modified)).then_some(modified))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 一次成功重载的结果
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    pub version: u64,
    pub counts: ModelCounts,
    pub duration_ms: u64,
}

type ReloadReply = oneshot::Sender<Result<ReloadOutcome, AppError>>;

/// 向重载任务发送请求的句柄
#[derive(Clone)]
pub struct ReloadTrigger {
    tx: mpsc::Sender<ReloadReply>,
}

impl ReloadTrigger {
    /// 请求立即重载并等待结果
    pub async fn reload(&self) -> Result<ReloadOutcome, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(reply_tx)
            .await
            .map_err(|_| AppError::ReloadUnavailable)?;
        reply_rx.await.map_err(|_| AppError::ReloadUnavailable)?
    }
}

pub struct ReloadService {
    source: Arc<dyn ModelSource>,
    handle: Arc<ModelHandle>,
    poll_interval: Option<Duration>,
    last_seen: Option<SystemTime>,
}

impl ReloadService {
    /// `poll_interval` 为 `None` 时只响应运维请求
    pub fn new(
        source: Arc<dyn ModelSource>,
        handle: Arc<ModelHandle>,
        poll_interval: Option<Duration>,
    ) -> Self {
        Self {
            source,
            handle,
            poll_interval,
            last_seen: None,
        }
    }

    /// 加载并替换当前模型
    pub async fn reload_now(&mut self) -> Result<ReloadOutcome, AppError> {
        let started = Instant::now();
        // 先取时间戳再加载，加载期间的修改会在下一轮检查中被发现
        let stamp = self.source.changed_since(None).await.unwrap_or(None);

        match self.source.load().await {
            Ok(model) => {
                let counts = model.counts();
                let version = self.handle.replace(model);
                if stamp.is_some() {
                    self.last_seen = stamp;
                }
                metrics::counter!("access_model_reloads_total", "result" => "success").increment(1);
                Ok(ReloadOutcome {
                    version,
                    counts,
                    duration_ms: started.elapsed().as_millis() as u64,
                })
            }
            Err(e) => {
                metrics::counter!("access_model_reloads_total", "result" => "failure").increment(1);
                tracing::error!(
                    source = %self.source.describe(),
                    error = %e,
                    active_version = self.handle.version(),
                    "Model reload failed, keeping active model"
                );
                Err(e)
            }
        }
    }

    /// 启动后台任务；所有 [`ReloadTrigger`] 被丢弃后任务退出
    pub fn spawn(mut self) -> (ReloadTrigger, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<ReloadReply>(8);

        let task = tokio::spawn(async move {
            let mut ticker = self.poll_interval.map(|period| {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker
            });

            tracing::info!(
                source = %self.source.describe(),
                poll_secs = ?self.poll_interval.map(|d| d.as_secs()),
                "Model reload worker started"
            );

            loop {
                tokio::select! {
                    request = rx.recv() => {
                        let Some(reply) = request else {
                            break;
                        };
                        let result = self.reload_now().await;
                        if let Ok(outcome) = &result {
                            tracing::info!(version = outcome.version, "Model reloaded on request");
                        }
                        // 请求方可能已经放弃等待
                        let _ = reply.send(result);
                    }
                    _ = tick(&mut ticker) => {
                        self.poll_once().await;
                    }
                }
            }

            tracing::info!("Model reload worker stopped");
        });

        (ReloadTrigger { tx }, task)
    }

    async fn poll_once(&mut self) {
        match self.source.changed_since(self.last_seen).await {
            Ok(Some(stamp)) => {
                tracing::info!(source = %self.source.describe(), "Model source changed");
                if self.reload_now().await.is_err() {
                    // 失败的版本不再重试，等待下一次修改
                    self.last_seen = Some(stamp);
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(source = %self.source.describe(), error = %e, "Cannot check model source");
            }
        }
    }
}

async fn tick(ticker: &mut Option<tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
