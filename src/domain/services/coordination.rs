// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 协调存储错误
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// Redis 访问错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// 协调存储特质
///
/// 所有工作进程共享的键值与滑动窗口存储，保存全局控制标志
/// （暂停、并发上限、作业间隔、重扫间隔）以及各来源的限流窗口。
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// 读取字符串值
    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError>;

    /// 写入字符串值（不过期）
    async fn set(&self, key: &str, value: &str) -> Result<(), CoordinationError>;

    /// 删除键
    async fn delete(&self, key: &str) -> Result<(), CoordinationError>;

    /// 尝试在滑动窗口中占用一个请求槽位
    ///
    /// 丢弃窗口外的时间戳、计数、插入当前时间戳三步必须原子执行。
    ///
    /// # 参数
    ///
    /// * `key` - 窗口键
    /// * `window` - 窗口长度
    /// * `max_requests` - 窗口内允许的最大请求数
    ///
    /// # 返回值
    ///
    /// 占用成功返回 `true`，窗口已满返回 `false`
    async fn try_acquire_window(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<bool, CoordinationError>;
}
