// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::coordination::{CoordinationError, CoordinationStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// 进程内协调存储
///
/// 单进程部署和测试使用，语义与 Redis 实现一致。
/// 滑动窗口的清理、计数和插入在同一个分片锁内完成。
#[derive(Default)]
pub struct MemoryCoordinationStore {
    values: DashMap<String, String>,
    windows: DashMap<String, VecDeque<Instant>>,
}

impl MemoryCoordinationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordinationStore for MemoryCoordinationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoordinationError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoordinationError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoordinationError> {
        self.values.remove(key);
        Ok(())
    }

    async fn try_acquire_window(
        &self,
        key: &str,
        window: Duration,
        max_requests: u32,
    ) -> Result<bool, CoordinationError> {
        let now = Instant::now();
        let mut stamps = self.windows.entry(key.to_string()).or_default();

        while stamps
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= window)
        {
            stamps.pop_front();
        }

        if stamps.len() < max_requests as usize {
            stamps.push_back(now);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
