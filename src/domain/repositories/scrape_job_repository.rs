// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobStatus, RunStatus, ScrapeJob, ScrapeRun};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 作业状态转换
///
/// 描述一次执行结束（或被回收、被暂停）后作业应写入的字段。
#[derive(Debug, Clone)]
pub struct JobTransition {
    pub status: JobStatus,
    pub next_scrape_after: Option<DateTime<FixedOffset>>,
    pub error_message: Option<String>,
    /// 累加到 photos_found 的数量
    pub photos_added: i32,
    /// 为 Some 时写入 last_scraped_at
    pub scraped_at: Option<DateTime<FixedOffset>>,
}

impl JobTransition {
    /// 回到待调度状态并立即可调度
    pub fn pending_now(now: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Pending,
            next_scrape_after: Some(now.into()),
            error_message: None,
            photos_added: 0,
            scraped_at: None,
        }
    }

    /// 成功完成
    pub fn completed(
        now: DateTime<Utc>,
        photos_added: i32,
        next_scrape_after: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status: JobStatus::Completed,
            next_scrape_after: next_scrape_after.map(Into::into),
            error_message: None,
            photos_added,
            scraped_at: Some(now.into()),
        }
    }

    /// 暂时性失败，到 retry_at 后重试
    pub fn failed(message: impl Into<String>, retry_at: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Failed,
            next_scrape_after: Some(retry_at.into()),
            error_message: Some(message.into()),
            photos_added: 0,
            scraped_at: None,
        }
    }

    /// 永久封锁，不再自动调度
    pub fn blocked(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Blocked,
            next_scrape_after: None,
            error_message: Some(message.into()),
            photos_added: 0,
            scraped_at: None,
        }
    }
}

/// 执行记录的最终结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub photos_found: i32,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub finished_at: DateTime<FixedOffset>,
}

impl RunOutcome {
    pub fn success(run: &ScrapeRun, photos_found: i32, now: DateTime<Utc>) -> Self {
        Self {
            run_id: run.id,
            status: RunStatus::Success,
            photos_found,
            duration_seconds: Some(run.elapsed_seconds(now)),
            error_message: None,
            finished_at: now.into(),
        }
    }

    pub fn failed(run: &ScrapeRun, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            run_id: run.id,
            status: RunStatus::Failed,
            photos_found: 0,
            duration_seconds: Some(run.elapsed_seconds(now)),
            error_message: Some(message.into()),
            finished_at: now.into(),
        }
    }
}

/// 重扫计划概览
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpcomingRescans {
    pub count: u64,
    pub next_at: Option<DateTime<FixedOffset>>,
}

/// 抓取作业仓库特质
///
/// 定义作业与执行记录的数据访问接口
#[async_trait]
pub trait ScrapeJobRepository: Send + Sync {
    /// 创建作业
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError>;
    /// 根据ID查找作业
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError>;
    /// 检查 (注册号, 来源) 组合是否已有作业
    async fn exists(&self, registration: &str, source: &str) -> Result<bool, RepositoryError>;
    /// 按状态查找作业，按创建时间排序
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<ScrapeJob>, RepositoryError>;
    /// 统计指定状态的作业数量
    async fn count_by_status(&self, status: JobStatus) -> Result<u64, RepositoryError>;
    /// 统计已到期的待调度作业数量
    async fn count_ready_pending(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 查找可调度作业：状态为 pending/completed 且已到期，按优先级降序
    async fn find_dispatchable(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ScrapeJob>, RepositoryError>;
    /// 将作业标记为运行中并创建执行记录，在同一事务中提交
    ///
    /// 只有可调度且已到期的作业会被启动；运行中、失败、封锁或尚未到期的
    /// 作业不做任何修改并返回 `None`。
    async fn start_run(
        &self,
        job_id: Uuid,
    ) -> Result<Option<(ScrapeJob, ScrapeRun)>, RepositoryError>;
    /// 把可调度且已到期的作业退回 pending，返回是否有修改
    async fn release_to_pending(
        &self,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
    /// 写入作业状态转换，并可选地结束一条执行记录
    ///
    /// 执行记录已结束时保持不变。
    async fn finish(
        &self,
        job_id: Uuid,
        transition: JobTransition,
        run: Option<RunOutcome>,
    ) -> Result<(), RepositoryError>;
    /// 查找作业最近一条运行中的执行记录
    async fn latest_running_run(&self, job_id: Uuid)
        -> Result<Option<ScrapeRun>, RepositoryError>;
    /// 将所有运行中的作业恢复为待调度，并以给定信息结束它们的运行记录
    async fn requeue_running(
        &self,
        now: DateTime<Utc>,
        run_message: &str,
    ) -> Result<u64, RepositoryError>;
    /// 将指定状态的作业恢复为待调度，返回被恢复的作业
    async fn requeue_status(
        &self,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScrapeJob>, RepositoryError>;
    /// 将注册号下所有未运行的作业恢复为待调度，返回被恢复的作业
    async fn requeue_registration(
        &self,
        registration: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScrapeJob>, RepositoryError>;
    /// 按新的重扫间隔重新计算所有已完成作业的下次抓取时间
    async fn reschedule_completed(&self, rescan_hours: u32) -> Result<u64, RepositoryError>;
    /// 成功执行记录的平均耗时（秒）
    async fn average_success_duration(&self) -> Result<Option<f64>, RepositoryError>;
    /// 未来待重扫的已完成作业
    async fn upcoming_rescans(&self, now: DateTime<Utc>) -> Result<UpcomingRescans, RepositoryError>;
    /// 删除所有作业和执行记录
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}
