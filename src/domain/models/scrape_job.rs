// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 抓取作业实体
///
/// 每个 (注册号, 照片来源) 组合对应一个作业。作业由导入流程创建，
/// 由调度器从 Pending 推进到 Running，再由作业处理器推进到
/// Completed / Failed / Blocked。除全量重置外作业永不删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// 作业唯一标识符
    pub id: Uuid,
    /// 飞机注册号
    pub registration: String,
    /// 照片来源标识
    pub source: String,
    /// 作业状态
    pub status: JobStatus,
    /// 优先级，数值越大越先调度
    pub priority: i32,
    /// 累计发现的照片数
    pub photos_found: i32,
    /// 最近一次成功抓取的时间
    pub last_scraped_at: Option<DateTime<FixedOffset>>,
    /// 下次允许抓取的时间，为空表示不再自动调度
    pub next_scrape_after: Option<DateTime<FixedOffset>>,
    /// 最近一次错误信息
    pub error_message: Option<String>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

/// 作业状态
///
/// 状态转换：
/// Pending → Running → Completed/Failed/Blocked，
/// 手动重置可将 Failed/Blocked/Running 恢复为 Pending。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 等待调度
    #[default]
    Pending,
    /// 执行中
    Running,
    /// 已完成，到期后可再次调度
    Completed,
    /// 暂时性失败，退避后重试
    Failed,
    /// 来源永久拒绝访问，需要人工重置
    Blocked,
}

impl JobStatus {
    /// 可被调度器选中的状态
    pub const DISPATCHABLE: [JobStatus; 2] = [JobStatus::Pending, JobStatus::Completed];
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "blocked" => Ok(JobStatus::Blocked),
            _ => Err(()),
        }
    }
}

impl ScrapeJob {
    /// 为新注册号创建一个待调度作业
    ///
    /// 新作业优先级为 1，立即可调度。
    pub fn new(registration: impl Into<String>, source: impl Into<String>) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().into();
        Self {
            id: Uuid::new_v4(),
            registration: registration.into(),
            source: source.into(),
            status: JobStatus::Pending,
            priority: 1,
            photos_found: 0,
            last_scraped_at: None,
            next_scrape_after: Some(now),
            error_message: None,
            created_at: now,
        }
    }

    /// 判断作业在给定时间是否可被调度
    pub fn is_dispatchable_at(&self, now: DateTime<Utc>) -> bool {
        JobStatus::DISPATCHABLE.contains(&self.status)
            && self.next_scrape_after.is_some_and(|at| at <= now)
    }
}

/// 抓取执行记录
///
/// 作业的每次执行尝试对应一条记录，结束后即为不可变历史，
/// 只有清扫器在回收超时运行时会再次修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRun {
    pub id: Uuid,
    pub job_id: Uuid,
    pub source: String,
    pub registration: String,
    pub status: RunStatus,
    pub photos_found: i32,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: Option<DateTime<FixedOffset>>,
}

/// 执行记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    Success,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(()),
        }
    }
}

impl ScrapeRun {
    /// 为作业开启一次新的执行记录
    pub fn start(job: &ScrapeJob) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id: job.id,
            source: job.source.clone(),
            registration: job.registration.clone(),
            status: RunStatus::Running,
            photos_found: 0,
            duration_seconds: None,
            error_message: None,
            started_at: Utc::now().into(),
            finished_at: None,
        }
    }

    /// 从开始到给定时间的耗时（秒）
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(self.started_at);
        elapsed.num_milliseconds() as f64 / 1000.0
    }
}
