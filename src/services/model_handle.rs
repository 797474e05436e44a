//! 当前生效模型的句柄
//!
//! 读方通过 `snapshot()` 无等待地取得 `Arc<AccessModel>`，整个决策过程都只使用这一份快照。
//! 写方在后台构建好新模型后调用 `replace()` 整体替换；互斥锁只用于串行化替换并分配版本号。

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::repository::AccessModel;

pub struct ModelHandle {
    active: ArcSwap<AccessModel>,
    next_version: Mutex<u64>,
}

impl ModelHandle {
    /// 以空模型（版本 0）开始
    pub fn empty() -> Self {
        Self {
            active: ArcSwap::from_pointee(AccessModel::empty()),
            next_version: Mutex::new(1),
        }
    }

    pub fn new(model: AccessModel) -> Self {
        let handle = Self::empty();
        handle.replace(model);
        handle
    }

    pub fn snapshot(&self) -> Arc<AccessModel> {
        self.active.load_full()
    }

    pub fn version(&self) -> u64 {
        self.active.load().version()
    }

    /// 替换当前模型，返回分配给新模型的版本号
    pub fn replace(&self, mut model: AccessModel) -> u64 {
        let mut next = self
            .next_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let version = *next;
        *next += 1;
        model.assign_version(version);
        let counts = model.counts();
        self.active.store(Arc::new(model));
        drop(next);

        metrics::gauge!("access_model_version").set(version as f64);
        tracing::info!(
            version,
            identities = counts.identities,
            groups = counts.groups,
            credentials = counts.credentials,
            schedules = counts.schedules,
            grants = counts.grants,
            "Access model activated"
        );
        version
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::empty()
    }
}
