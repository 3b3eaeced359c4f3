// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::coordination::{CoordinationError, CoordinationStore};
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use std::time::Duration;
use uuid::Uuid;

/// 滑动窗口脚本：清理窗口外成员、计数、未满时插入并刷新过期时间
const SLIDING_WINDOW_SCRIPT: &str = r#"
    local key = KEYS[1]
    local now = tonumber(ARGV[1])
    local window = tonumber(ARGV[2])
    local max_requests = tonumber(ARGV[3])
    local member = ARGV[4]
    local ttl = tonumber(ARGV[5])

    redis.call("ZREMRANGEBYSCORE", key, 0, now - window)

    local current = redis.call("ZCARD", key)
    if current < max_requests then
        redis.call("ZADD", key, now, member)
        redis.call("EXPIRE", key, ttl)
        return 1
    end
    return 0
"#;

/// 基于 Redis 的协调存储
///
/// 多个工作进程共享同一个 Redis 实例时，控制标志和限流窗口全局一致。
#[derive(Clone)]
pub struct RedisCoordinationStore {
    /// Redis客户端
    client: redis::Client,
}

impl RedisCoordinationStore {
    /// 创建新的 Redis 协调存储
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisCoordinationStore)` - 存储实例
    /// * `Err(CoordinationError)` - URL 无效
    pub fn new(redis_url: &str) -> Result<Self, CoordinationError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CoordinationError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        let mut con = self.connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoordinationError> {
        let mut con = self.connection().await?;
        con.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoordinationError> {
        let mut con = self.connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn try_acquire_window(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<bool, CoordinationError> {
        let mut con = self.connection().await?;

        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        // 同一时刻的多个请求需要不同的成员
        let member = format!("{}:{}", now, Uuid::new_v4());
        let ttl = window.as_secs() + 10;

        let admitted: i64 = redis::Script::new(SLIDING_WINDOW_SCRIPT)
            .key(key)
            .arg(now)
            .arg(window.as_secs_f64())
            .arg(max_requests)
            .arg(member)
            .arg(ttl)
            .invoke_async(&mut con)
            .await?;

        Ok(admitted == 1)
    }
}
