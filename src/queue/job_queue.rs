// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 所有工作器都已退出，接收端关闭
    #[error("Job queue closed")]
    Closed,
}

/// 作业队列特质
///
/// 作业执行子系统的入口。允许重复提交同一作业，
/// 重复的执行由作业处理器识别为无操作。
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 提交作业，`delay` 之后才对工作器可见
    async fn submit(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError>;
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn submit(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError> {
        (**self).submit(job_id, delay).await
    }
}

/// 工作器共享的接收端
pub type JobReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Uuid>>>;

/// 基于 tokio 通道的作业队列
///
/// 延迟提交由独立的定时任务在到期后写入通道。
#[derive(Clone)]
pub struct ChannelJobQueue {
    sender: mpsc::UnboundedSender<Uuid>,
}

impl ChannelJobQueue {
    /// 创建队列及其共享接收端
    pub fn channel() -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, Arc::new(Mutex::new(receiver)))
    }
}

#[async_trait]
impl JobQueue for ChannelJobQueue {
    async fn submit(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError> {
        if self.sender.is_closed() {
            return Err(QueueError::Closed);
        }

        if delay.is_zero() {
            return self.sender.send(job_id).map_err(|_| QueueError::Closed);
        }

        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(job_id).is_err() {
                warn!("Dropped deferred job {}: queue closed", job_id);
            }
        });
        Ok(())
    }
}
