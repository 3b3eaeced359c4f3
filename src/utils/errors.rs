// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::scrape_job_repository::RepositoryError;
use crate::domain::services::coordination::CoordinationError;
use crate::queue::job_queue::QueueError;
use thiserror::Error;

/// 调度错误类型
///
/// 调度器、作业处理器和清扫器共用
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("仓库错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("协调存储错误: {0}")]
    Coordination(#[from] CoordinationError),

    #[error("队列错误: {0}")]
    Queue(#[from] QueueError),
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("调度错误: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("内部错误: {0}")]
    InternalError(String),
}
