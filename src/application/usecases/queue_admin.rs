// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use crate::domain::repositories::flight_repository::FlightRepository;
use crate::domain::repositories::photo_repository::PhotoRepository;
use crate::domain::repositories::scrape_job_repository::{RepositoryError, ScrapeJobRepository};
use crate::domain::services::queue_control::{QueueControl, QueueSettings, SettingsUpdate};
use crate::queue::dispatcher::Dispatcher;
use crate::utils::errors::SchedulerError;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const REPROCESS_MESSAGE: &str = "Queue reprocessed";

/// 队列统计
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// 已到期的待调度作业
    pub pending: u64,
    pub running: u64,
    pub completed: u64,
    pub failed: u64,
    pub blocked: u64,
    /// 成功执行的平均耗时（秒）
    pub average_duration_seconds: Option<f64>,
    pub upcoming_rescans: u64,
    pub next_rescan_at: Option<DateTime<FixedOffset>>,
    /// 清空已到期作业的预计分钟数
    pub eta_minutes: u64,
    pub settings: QueueSettings,
    pub failed_jobs: Vec<ScrapeJob>,
}

/// 重置类操作的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequeueReport {
    /// 被恢复为 pending 的作业数
    pub reset: usize,
    /// 立即提交的作业数
    pub submitted: usize,
}

/// 全量重置的删除计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub matches: u64,
    pub photos: u64,
    pub jobs: u64,
    pub flights: u64,
}

/// 预计剩余分钟数
///
/// 每个作业按平均耗时加作业间隔估算，有待处理作业时至少为 1。
pub fn eta_minutes(pending: u64, average_duration: f64, job_delay_seconds: u32) -> u64 {
    if pending == 0 || average_duration <= 0.0 {
        return 0;
    }
    let seconds = pending as f64 * (average_duration + f64::from(job_delay_seconds));
    ((seconds / 60.0).ceil() as u64).max(1)
}

/// 队列管理用例
///
/// 暂停、恢复、调整设置、批量重置与统计，供管理接口调用。
pub struct QueueAdmin {
    jobs: Arc<dyn ScrapeJobRepository>,
    flights: Arc<dyn FlightRepository>,
    photos: Arc<dyn PhotoRepository>,
    dispatcher: Arc<Dispatcher>,
}

impl QueueAdmin {
    pub fn new(
        jobs: Arc<dyn ScrapeJobRepository>,
        flights: Arc<dyn FlightRepository>,
        photos: Arc<dyn PhotoRepository>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            jobs,
            flights,
            photos,
            dispatcher,
        }
    }

    fn control(&self) -> &QueueControl {
        self.dispatcher.control()
    }

    pub async fn pause(&self) -> Result<(), SchedulerError> {
        self.control().pause().await?;
        info!("Queue paused");
        Ok(())
    }

    /// 恢复队列并立即填充空闲槽位
    pub async fn resume(&self) -> Result<usize, SchedulerError> {
        self.control().resume().await?;
        let submitted = self.dispatcher.seed().await?;
        info!("Queue resumed, {} jobs submitted", submitted);
        Ok(submitted)
    }

    /// 更新控制项
    ///
    /// 修改重扫间隔时，所有 completed 作业的下次抓取时间按新间隔重算。
    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<QueueSettings, SchedulerError> {
        let settings = self.control().apply_settings(update).await?;
        if update.rescan_interval_hours.is_some() {
            let rescheduled = self
                .jobs
                .reschedule_completed(settings.rescan_interval_hours)
                .await?;
            info!(
                "Rescan interval set to {}h, rescheduled {} completed jobs",
                settings.rescan_interval_hours, rescheduled
            );
        }
        Ok(settings)
    }

    /// 重新处理
    ///
    /// 暂停队列，把 running 作业（其执行记录标记失败）和 failed 作业
    /// 恢复为 pending，然后恢复队列并填充槽位。
    pub async fn reprocess(&self) -> Result<RequeueReport, SchedulerError> {
        let now = Utc::now();
        self.control().pause().await?;

        let running = self.jobs.requeue_running(now, REPROCESS_MESSAGE).await?;
        let failed = self.jobs.requeue_status(JobStatus::Failed, now).await?;
        let reset = running as usize + failed.len();
        info!(
            "Queue reprocessed: reset {} running + {} failed = {} jobs",
            running,
            failed.len(),
            reset
        );

        self.control().resume().await?;
        let submitted = self.dispatcher.seed().await?;
        Ok(RequeueReport { reset, submitted })
    }

    /// 重试失败作业，最多立即提交并发上限个，其余由自调度链接续
    pub async fn retry_failed(&self) -> Result<RequeueReport, SchedulerError> {
        let failed = self
            .jobs
            .requeue_status(JobStatus::Failed, Utc::now())
            .await?;
        let max_jobs = self.control().max_jobs().await? as usize;

        let ids: Vec<Uuid> = failed.iter().take(max_jobs).map(|job| job.id).collect();
        let submitted = self.dispatcher.submit_now(&ids).await?;
        info!("Retrying {} failed jobs, {} submitted", failed.len(), submitted);

        Ok(RequeueReport {
            reset: failed.len(),
            submitted,
        })
    }

    /// 立即重扫一个注册号的全部作业
    ///
    /// 正在运行的作业保持不变。注册号没有任何作业时返回 `NotFound`。
    pub async fn rescan_registration(
        &self,
        registration: &str,
    ) -> Result<RequeueReport, SchedulerError> {
        let jobs = self
            .jobs
            .requeue_registration(registration, Utc::now())
            .await?;
        if jobs.is_empty() && !self.has_running_job(registration).await? {
            return Err(RepositoryError::NotFound.into());
        }

        let ids: Vec<Uuid> = jobs.iter().map(|job| job.id).collect();
        let submitted = self.dispatcher.submit_now(&ids).await?;
        info!("Manual rescan of {}: {} jobs submitted", registration, submitted);

        Ok(RequeueReport {
            reset: jobs.len(),
            submitted,
        })
    }

    async fn has_running_job(&self, registration: &str) -> Result<bool, RepositoryError> {
        let running = self.jobs.find_by_status(JobStatus::Running).await?;
        Ok(running.iter().any(|job| job.registration == registration))
    }

    /// 删除全部匹配、照片、执行记录、作业和航班
    pub async fn full_reset(&self) -> Result<ResetReport, SchedulerError> {
        let report = ResetReport {
            matches: self.photos.delete_all_matches().await?,
            photos: self.photos.delete_all_photos().await?,
            jobs: self.jobs.delete_all().await?,
            flights: self.flights.delete_all().await?,
        };
        info!("Full reset: {:?}", report);
        Ok(report)
    }

    pub async fn stats(&self) -> Result<QueueStats, SchedulerError> {
        let now = Utc::now();
        let settings = self.control().settings().await?;

        let pending = self.jobs.count_ready_pending(now).await?;
        let average = self.jobs.average_success_duration().await?;
        let upcoming = self.jobs.upcoming_rescans(now).await?;

        Ok(QueueStats {
            pending,
            running: self.jobs.count_by_status(JobStatus::Running).await?,
            completed: self.jobs.count_by_status(JobStatus::Completed).await?,
            failed: self.jobs.count_by_status(JobStatus::Failed).await?,
            blocked: self.jobs.count_by_status(JobStatus::Blocked).await?,
            average_duration_seconds: average,
            upcoming_rescans: upcoming.count,
            next_rescan_at: upcoming.next_at,
            eta_minutes: eta_minutes(
                pending,
                average.unwrap_or_default(),
                settings.job_delay_seconds,
            ),
            settings,
            failed_jobs: self.jobs.find_by_status(JobStatus::Failed).await?,
        })
    }
}

#[cfg(test)]
#[path = "queue_admin_test.rs"]
mod tests;
