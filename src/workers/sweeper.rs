// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::JobStatus;
use crate::domain::repositories::scrape_job_repository::{
    JobTransition, RunOutcome, ScrapeJobRepository,
};
use crate::infrastructure::observability::metrics::JOBS_REAPED;
use crate::queue::dispatcher::Dispatcher;
use crate::utils::errors::SchedulerError;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const ORPHANED_MESSAGE: &str = "Stuck in running with no active scrape run";
const RESTART_MESSAGE: &str = "Worker restarted";

/// 一轮清扫的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// 被回收的作业数
    pub reaped: usize,
    /// 重新提交的作业数
    pub submitted: usize,
}

/// 清扫器
///
/// 自调度链之外的兜底：定期回收卡在 running 的作业，再按空闲槽位补充提交。
pub struct Sweeper {
    jobs: Arc<dyn ScrapeJobRepository>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
    stale_timeout: chrono::Duration,
    failure_backoff: chrono::Duration,
}

impl Sweeper {
    /// 创建清扫器
    ///
    /// # 参数
    ///
    /// * `jobs` - 作业仓库
    /// * `dispatcher` - 分发器
    /// * `interval` - 清扫周期
    /// * `stale_timeout` - 执行记录超过该时长仍在运行即视为卡死
    /// * `failure_backoff` - 被回收作业的重试间隔
    pub fn new(
        jobs: Arc<dyn ScrapeJobRepository>,
        dispatcher: Arc<Dispatcher>,
        interval: Duration,
        stale_timeout: chrono::Duration,
        failure_backoff: chrono::Duration,
    ) -> Self {
        Self {
            jobs,
            dispatcher,
            interval,
            stale_timeout,
            failure_backoff,
        }
    }

    /// 运行清扫循环
    pub async fn run(&self) {
        info!("Sweeper started, interval {}s", self.interval.as_secs());

        let mut interval = tokio::time::interval(self.interval);
        // the first tick completes immediately; startup recovery already seeded
        interval.tick().await;

        loop {
            interval.tick().await;

            match self.sweep().await {
                Ok(report) => {
                    if report.reaped > 0 || report.submitted > 0 {
                        info!(
                            "Sweeper reaped {} stale jobs, submitted {}",
                            report.reaped, report.submitted
                        );
                    }
                }
                Err(e) => {
                    error!("Sweep failed: {}", e);
                }
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// 执行一轮清扫
    pub async fn sweep(&self) -> Result<SweepReport, SchedulerError> {
        let reaped = self.reap_stale().await?;
        let submitted = self.dispatcher.seed().await?;
        Ok(SweepReport { reaped, submitted })
    }

    async fn reap_stale(&self) -> Result<usize, SchedulerError> {
        let now = Utc::now();
        let cutoff = now - self.stale_timeout;
        let timeout_message = format!(
            "Timed out after {} minutes",
            self.stale_timeout.num_minutes()
        );

        let mut reaped = 0;
        for job in self.jobs.find_by_status(JobStatus::Running).await? {
            let retry_at = now + self.failure_backoff;
            match self.jobs.latest_running_run(job.id).await? {
                Some(run) if run.started_at.with_timezone(&Utc) < cutoff => {
                    self.jobs
                        .finish(
                            job.id,
                            JobTransition::failed(timeout_message.clone(), retry_at),
                            Some(RunOutcome::failed(&run, timeout_message.clone(), now)),
                        )
                        .await?;
                }
                Some(_) => continue,
                None => {
                    self.jobs
                        .finish(job.id, JobTransition::failed(ORPHANED_MESSAGE, retry_at), None)
                        .await?;
                }
            }
            counter!(JOBS_REAPED, "source" => job.source.clone()).increment(1);
            reaped += 1;
        }

        if reaped > 0 {
            warn!("Sweeper: reaped {} stale running jobs", reaped);
        }
        Ok(reaped)
    }

    /// 启动恢复
    ///
    /// 上一个进程遗留的 running 作业全部退回 pending，其执行记录标记为失败，
    /// 随后按空闲槽位播种。数据库尚未就绪时按 `retry_delay` 重试，
    /// 最多 `attempts` 次，仍失败则只记录警告。
    pub async fn recover_on_startup(&self, attempts: u32, retry_delay: Duration) -> usize {
        for attempt in 1..=attempts.max(1) {
            match self.jobs.requeue_running(Utc::now(), RESTART_MESSAGE).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Reset {} stale running jobs to pending", count);
                    }
                    break;
                }
                Err(e) if attempt < attempts => {
                    info!(
                        "Waiting for database (attempt {}/{}): {}",
                        attempt, attempts, e
                    );
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => {
                    warn!(
                        "Database not ready after {} attempts, starting anyway: {}",
                        attempts, e
                    );
                }
            }
        }

        match self.dispatcher.seed().await {
            Ok(submitted) => {
                info!("Seeded {} jobs on startup", submitted);
                submitted
            }
            Err(e) => {
                error!("Failed to seed queue on startup: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod tests;
