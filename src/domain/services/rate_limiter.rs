// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::coordination::{CoordinationError, CoordinationStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 单个来源的限流策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// 窗口内允许的最大请求数
    pub max_requests: u32,
    /// 窗口长度
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_seconds),
        }
    }
}

/// 按来源的滑动窗口限流器
///
/// 窗口状态保存在协调存储中，跨进程安全。
/// `acquire` 只会等待，不会因为竞争而报错。
pub struct SourceRateLimiter {
    store: Arc<dyn CoordinationStore>,
    policies: HashMap<String, RateLimitPolicy>,
    poll_interval: Duration,
}

impl SourceRateLimiter {
    /// 创建限流器
    ///
    /// # 参数
    ///
    /// * `store` - 协调存储
    /// * `policies` - 来源名称到限流策略的映射
    /// * `poll_interval` - 窗口已满时的重试间隔
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        policies: HashMap<String, RateLimitPolicy>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            policies,
            poll_interval,
        }
    }

    fn window_key(source: &str) -> String {
        format!("ratelimit:{}", source)
    }

    /// 等待直到来源有可用的请求槽位，然后占用一个
    ///
    /// 没有配置策略的来源不受限制。协调存储本身出错时返回错误，
    /// 由调用方按暂时性失败处理。
    pub async fn acquire(&self, source: &str) -> Result<(), CoordinationError> {
        let Some(policy) = self.policies.get(source).copied() else {
            warn!("No rate limit policy for source {}, proceeding unthrottled", source);
            return Ok(());
        };

        let key = Self::window_key(source);
        let mut waited = 0u32;
        loop {
            if self
                .store
                .try_acquire_window(&key, policy.window, policy.max_requests)
                .await?
            {
                if waited > 0 {
                    debug!("Rate limit slot for {} acquired after {} polls", source, waited);
                }
                return Ok(());
            }
            waited += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
