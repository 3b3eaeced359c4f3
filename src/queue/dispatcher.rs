// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::JobStatus;
use crate::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use crate::domain::services::queue_control::QueueControl;
use crate::infrastructure::observability::metrics::JOBS_DISPATCHED;
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::SchedulerError;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// 作业分发器
///
/// 按全局并发上限把到期作业提交给作业队列。每个作业结束后都会调用
/// `fill_slots`，形成自调度链；清扫器和导入流程调用 `seed`。
/// 运行中数量每次都重新读取，短暂超出上限是允许的，
/// 重复提交由作业处理器识别。
pub struct Dispatcher {
    jobs: Arc<dyn ScrapeJobRepository>,
    queue: Arc<dyn JobQueue>,
    control: QueueControl,
    /// 自调度提交是否按作业间隔延迟
    stagger: bool,
}

impl Dispatcher {
    /// 创建分发器
    ///
    /// # 参数
    ///
    /// * `jobs` - 作业仓库
    /// * `queue` - 作业队列
    /// * `control` - 队列控制上下文
    /// * `stagger` - 自调度提交是否按作业间隔延迟
    pub fn new(
        jobs: Arc<dyn ScrapeJobRepository>,
        queue: Arc<dyn JobQueue>,
        control: QueueControl,
        stagger: bool,
    ) -> Self {
        Self {
            jobs,
            queue,
            control,
            stagger,
        }
    }

    pub fn control(&self) -> &QueueControl {
        &self.control
    }

    /// 填充空闲槽位，提交按作业间隔延迟
    ///
    /// # 返回值
    ///
    /// 返回本轮提交的作业数量，暂停或无空闲槽位时为 0
    pub async fn fill_slots(&self) -> Result<usize, SchedulerError> {
        self.dispatch(self.stagger).await
    }

    /// 填充空闲槽位，立即提交
    pub async fn seed(&self) -> Result<usize, SchedulerError> {
        self.dispatch(false).await
    }

    /// 立即提交指定作业，不检查并发上限
    pub async fn submit_now(&self, job_ids: &[Uuid]) -> Result<usize, SchedulerError> {
        for job_id in job_ids {
            self.queue.submit(*job_id, Duration::ZERO).await?;
        }
        Ok(job_ids.len())
    }

    async fn dispatch(&self, deferred: bool) -> Result<usize, SchedulerError> {
        if self.control.is_paused().await? {
            debug!("Queue paused, not dispatching");
            return Ok(0);
        }

        let max_jobs = self.control.max_jobs().await?;
        let running = self.jobs.count_by_status(JobStatus::Running).await?;
        let slots = u64::from(max_jobs).saturating_sub(running);
        if slots == 0 {
            debug!("No slots available ({}/{} running)", running, max_jobs);
            return Ok(0);
        }

        let delay = if deferred {
            Duration::from_secs(u64::from(self.control.job_delay_seconds().await?))
        } else {
            Duration::ZERO
        };

        let jobs = self.jobs.find_dispatchable(Utc::now(), slots).await?;
        for job in &jobs {
            self.queue.submit(job.id, delay).await?;
            counter!(JOBS_DISPATCHED, "source" => job.source.clone()).increment(1);
        }

        if !jobs.is_empty() {
            info!(
                "Dispatched {} jobs ({} running, cap {}, delay {}s)",
                jobs.len(),
                running,
                max_jobs,
                delay.as_secs()
            );
        }
        Ok(jobs.len())
    }
}
