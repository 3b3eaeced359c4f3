// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::coordination::{CoordinationError, CoordinationStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// 默认并发上限
pub const DEFAULT_MAX_JOBS: u32 = 3;
/// 默认作业间隔（秒）
pub const DEFAULT_JOB_DELAY_SECONDS: u32 = 5;
/// 默认重扫间隔（小时）
pub const DEFAULT_RESCAN_INTERVAL_HOURS: u32 = 168;
/// 允许的重扫间隔（小时），0 表示不自动重扫
pub const ALLOWED_RESCAN_INTERVALS: [u32; 6] = [0, 24, 72, 168, 336, 720];

const MAX_JOBS_RANGE: (i64, i64) = (1, 10);
const JOB_DELAY_RANGE: (i64, i64) = (0, 60);

/// 队列运行时控制项快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub paused: bool,
    pub max_jobs: u32,
    pub job_delay_seconds: u32,
    pub rescan_interval_hours: u32,
}

/// 设置更新请求，未提供的字段保持不变
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub max_jobs: Option<i64>,
    pub job_delay_seconds: Option<i64>,
    pub rescan_interval_hours: Option<i64>,
}

/// 将并发上限限制在 [1, 10]
pub fn clamp_max_jobs(value: i64) -> u32 {
    value.clamp(MAX_JOBS_RANGE.0, MAX_JOBS_RANGE.1) as u32
}

/// 将作业间隔限制在 [0, 60] 秒
pub fn clamp_job_delay(value: i64) -> u32 {
    value.clamp(JOB_DELAY_RANGE.0, JOB_DELAY_RANGE.1) as u32
}

/// 不在允许集合中的重扫间隔回退为默认值
pub fn normalize_rescan_interval(value: i64) -> u32 {
    ALLOWED_RESCAN_INTERVALS
        .iter()
        .copied()
        .find(|allowed| i64::from(*allowed) == value)
        .unwrap_or(DEFAULT_RESCAN_INTERVAL_HOURS)
}

/// 队列控制上下文
///
/// 调度器、作业处理器和清扫器共享的唯一配置入口，
/// 所有值都存放在协调存储中，每次读取都是最新值。
#[derive(Clone)]
pub struct QueueControl {
    store: Arc<dyn CoordinationStore>,
    prefix: String,
}

impl QueueControl {
    /// 创建队列控制上下文
    ///
    /// # 参数
    ///
    /// * `store` - 协调存储
    /// * `prefix` - 控制键前缀，例如 `ts:`
    pub fn new(store: Arc<dyn CoordinationStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// 底层协调存储
    pub fn store(&self) -> Arc<dyn CoordinationStore> {
        self.store.clone()
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// 队列是否暂停（键存在即为暂停）
    pub async fn is_paused(&self) -> Result<bool, CoordinationError> {
        Ok(self.store.get(&self.key("paused")).await?.is_some())
    }

    /// 全局并发上限
    pub async fn max_jobs(&self) -> Result<u32, CoordinationError> {
        let raw = self.read_int("max_jobs").await?;
        Ok(raw.map(clamp_max_jobs).unwrap_or(DEFAULT_MAX_JOBS))
    }

    /// 作业之间的间隔秒数
    pub async fn job_delay_seconds(&self) -> Result<u32, CoordinationError> {
        let raw = self.read_int("job_delay").await?;
        Ok(raw.map(clamp_job_delay).unwrap_or(DEFAULT_JOB_DELAY_SECONDS))
    }

    /// 重扫间隔小时数，0 表示不自动重扫
    pub async fn rescan_interval_hours(&self) -> Result<u32, CoordinationError> {
        let raw = self.read_int("rescan_interval").await?;
        Ok(raw
            .map(normalize_rescan_interval)
            .unwrap_or(DEFAULT_RESCAN_INTERVAL_HOURS))
    }

    /// 读取全部控制项
    pub async fn settings(&self) -> Result<QueueSettings, CoordinationError> {
        Ok(QueueSettings {
            paused: self.is_paused().await?,
            max_jobs: self.max_jobs().await?,
            job_delay_seconds: self.job_delay_seconds().await?,
            rescan_interval_hours: self.rescan_interval_hours().await?,
        })
    }

    /// 设置暂停标志
    pub async fn pause(&self) -> Result<(), CoordinationError> {
        self.store.set(&self.key("paused"), "1").await
    }

    /// 清除暂停标志
    pub async fn resume(&self) -> Result<(), CoordinationError> {
        self.store.delete(&self.key("paused")).await
    }

    /// 应用设置更新，超出范围的值会被限制后写入
    ///
    /// # 返回值
    ///
    /// 返回更新后的完整控制项
    pub async fn apply_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<QueueSettings, CoordinationError> {
        if let Some(max_jobs) = update.max_jobs {
            self.store
                .set(&self.key("max_jobs"), &clamp_max_jobs(max_jobs).to_string())
                .await?;
        }
        if let Some(delay) = update.job_delay_seconds {
            self.store
                .set(&self.key("job_delay"), &clamp_job_delay(delay).to_string())
                .await?;
        }
        if let Some(hours) = update.rescan_interval_hours {
            self.store
                .set(
                    &self.key("rescan_interval"),
                    &normalize_rescan_interval(hours).to_string(),
                )
                .await?;
        }
        self.settings().await
    }

    async fn read_int(&self, name: &str) -> Result<Option<i64>, CoordinationError> {
        let key = self.key(name);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!("Ignoring malformed value {:?} for {}", raw, key);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::memory_store::MemoryCoordinationStore;

    fn control() -> (Arc<MemoryCoordinationStore>, QueueControl) {
        let store = Arc::new(MemoryCoordinationStore::new());
        let control = QueueControl::new(store.clone(), "ts:");
        (store, control)
    }

    #[tokio::test]
    async fn test_defaults_when_store_is_empty() {
        let (_, control) = control();
        let settings = control.settings().await.unwrap();
        assert_eq!(
            settings,
            QueueSettings {
                paused: false,
                max_jobs: 3,
                job_delay_seconds: 5,
                rescan_interval_hours: 168,
            }
        );
    }

    #[tokio::test]
    async fn test_pause_flag_is_presence_based() {
        let (store, control) = control();
        control.pause().await.unwrap();
        assert!(control.is_paused().await.unwrap());
        assert!(store.get("ts:paused").await.unwrap().is_some());

        control.resume().await.unwrap();
        assert!(!control.is_paused().await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_settings_clamps_out_of_range_values() {
        let (_, control) = control();
        let settings = control
            .apply_settings(SettingsUpdate {
                max_jobs: Some(50),
                job_delay_seconds: Some(-4),
                rescan_interval_hours: Some(100),
            })
            .await
            .unwrap();

        assert_eq!(settings.max_jobs, 10);
        assert_eq!(settings.job_delay_seconds, 0);
        assert_eq!(settings.rescan_interval_hours, 168);

        let settings = control
            .apply_settings(SettingsUpdate {
                max_jobs: Some(0),
                rescan_interval_hours: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(settings.max_jobs, 1);
        assert_eq!(settings.job_delay_seconds, 0);
        assert_eq!(settings.rescan_interval_hours, 0);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back_to_defaults() {
        let (store, control) = control();
        store.set("ts:max_jobs", "lots").await.unwrap();
        store.set("ts:job_delay", "99").await.unwrap();

        assert_eq!(control.max_jobs().await.unwrap(), DEFAULT_MAX_JOBS);
        assert_eq!(control.job_delay_seconds().await.unwrap(), 60);
    }
}
