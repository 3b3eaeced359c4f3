// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::photo::CandidatePhoto;
use crate::domain::models::scrape_job::{JobStatus, ScrapeJob};
use crate::domain::repositories::flight_repository::FlightRepository;
use crate::domain::repositories::photo_repository::PhotoRepository;
use crate::domain::repositories::scrape_job_repository::{
    JobTransition, RunOutcome, ScrapeJobRepository,
};
use crate::domain::services::photo_matcher::PhotoMatcher;
use crate::domain::services::plausibility::PlausibilityFilter;
use crate::domain::services::queue_control::{QueueControl, DEFAULT_RESCAN_INTERVAL_HOURS};
use crate::domain::services::rate_limiter::SourceRateLimiter;
use crate::engines::registry::ScraperRegistry;
use crate::infrastructure::observability::metrics::{
    JOBS_BLOCKED, JOBS_COMPLETED, JOBS_FAILED, JOB_DURATION, MATCHES_CREATED, PHOTOS_ACCEPTED,
    PHOTOS_FILTERED,
};
use crate::queue::dispatcher::Dispatcher;
use crate::utils::errors::SchedulerError;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

/// 单个作业的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// 作业不存在
    NotFound,
    /// 作业已在运行，本次为重复提交
    Duplicate,
    /// 队列已暂停，作业退回待调度
    Paused,
    Completed { photos_found: i32 },
    Blocked { reason: String },
    Failed { reason: String },
    /// 持久化本身出错，作业留给清扫器回收
    Aborted { reason: String },
}

/// 一次抓取失败的分类
enum ScrapeFailure {
    Blocked(String),
    Transient(String),
}

/// 抓取阶段的结果
enum ScrapeStep {
    Paused,
    Stored { accepted: i32 },
}

/// 抓取作业处理器
///
/// 执行单个作业的完整流程：暂停检查、占用执行记录、按来源限流、
/// 抓取、合理性过滤、保存候选照片、匹配，最后写回作业状态。
/// 无论结果如何，结束时都会通过分发器补满空闲槽位。
pub struct ScrapeJobProcessor {
    jobs: Arc<dyn ScrapeJobRepository>,
    flights: Arc<dyn FlightRepository>,
    photos: Arc<dyn PhotoRepository>,
    matcher: PhotoMatcher,
    scrapers: ScraperRegistry,
    rate_limiter: Arc<SourceRateLimiter>,
    dispatcher: Arc<Dispatcher>,
    failure_backoff: chrono::Duration,
}

impl ScrapeJobProcessor {
    /// 创建作业处理器
    ///
    /// # 参数
    ///
    /// * `jobs` - 作业仓库
    /// * `flights` - 航班仓库
    /// * `photos` - 照片与匹配仓库
    /// * `scrapers` - 抓取器注册表
    /// * `rate_limiter` - 来源限流器
    /// * `dispatcher` - 分发器，用于结束后补位
    /// * `failure_backoff` - 暂时性失败后的重试间隔
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jobs: Arc<dyn ScrapeJobRepository>,
        flights: Arc<dyn FlightRepository>,
        photos: Arc<dyn PhotoRepository>,
        scrapers: ScraperRegistry,
        rate_limiter: Arc<SourceRateLimiter>,
        dispatcher: Arc<Dispatcher>,
        failure_backoff: chrono::Duration,
    ) -> Self {
        Self {
            matcher: PhotoMatcher::new(flights.clone(), photos.clone()),
            jobs,
            flights,
            photos,
            scrapers,
            rate_limiter,
            dispatcher,
            failure_backoff,
        }
    }

    fn control(&self) -> &QueueControl {
        self.dispatcher.control()
    }

    /// 处理一个作业
    ///
    /// 不返回错误：所有失败都记录在作业和执行记录上，
    /// 持久化失败只写日志，作业留在 running 状态等待清扫器回收。
    #[instrument(
        skip(self),
        fields(registration = tracing::field::Empty, source = tracing::field::Empty)
    )]
    pub async fn process(&self, job_id: Uuid) -> ProcessOutcome {
        let outcome = match self.execute(job_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to persist outcome of job {}: {}", job_id, e);
                ProcessOutcome::Aborted {
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = self.dispatcher.fill_slots().await {
            error!("Failed to dispatch follow-up jobs after {}: {}", job_id, e);
        }
        outcome
    }

    async fn execute(&self, job_id: Uuid) -> Result<ProcessOutcome, SchedulerError> {
        let Some(job) = self.jobs.find_by_id(job_id).await? else {
            warn!("Job {} not found", job_id);
            return Ok(ProcessOutcome::NotFound);
        };
        Span::current().record("registration", job.registration.as_str());
        Span::current().record("source", job.source.as_str());

        if job.status == JobStatus::Running {
            debug!("Job {} already running, skipping duplicate", job_id);
            return Ok(ProcessOutcome::Duplicate);
        }

        if !job.is_dispatchable_at(Utc::now()) {
            debug!(
                "Job {} is {} and not due, skipping stale dispatch",
                job_id, job.status
            );
            return Ok(ProcessOutcome::Duplicate);
        }

        if self.control().is_paused().await? {
            if !self.jobs.release_to_pending(job_id, Utc::now()).await? {
                debug!("Job {} changed state before pause reset", job_id);
                return Ok(ProcessOutcome::Duplicate);
            }
            info!("Job {} paused before start, reset to pending", job_id);
            return Ok(ProcessOutcome::Paused);
        }

        let Some((job, run)) = self.jobs.start_run(job_id).await? else {
            debug!("Job {} was claimed by another worker", job_id);
            return Ok(ProcessOutcome::Duplicate);
        };

        let result = self.scrape(&job).await;
        let now = Utc::now();

        match result {
            Ok(ScrapeStep::Paused) => {
                self.jobs
                    .finish(
                        job.id,
                        JobTransition::pending_now(now),
                        Some(RunOutcome::failed(&run, "Paused", now)),
                    )
                    .await?;
                info!("Job {} paused before scrape, reset to pending", job.id);
                Ok(ProcessOutcome::Paused)
            }
            Ok(ScrapeStep::Stored { accepted }) => {
                let rescan_hours = match self.control().rescan_interval_hours().await {
                    Ok(hours) => hours,
                    Err(e) => {
                        warn!("Failed to read rescan interval, using default: {}", e);
                        DEFAULT_RESCAN_INTERVAL_HOURS
                    }
                };
                let next = (rescan_hours > 0)
                    .then(|| now + chrono::Duration::hours(i64::from(rescan_hours)));

                let outcome = RunOutcome::success(&run, accepted, now);
                let duration = outcome.duration_seconds.unwrap_or_default();
                self.jobs
                    .finish(
                        job.id,
                        JobTransition::completed(now, accepted, next),
                        Some(outcome),
                    )
                    .await?;

                counter!(JOBS_COMPLETED, "source" => job.source.clone()).increment(1);
                histogram!(JOB_DURATION, "source" => job.source.clone()).record(duration);
                info!(
                    "Scraped {} from {}: {} new photos in {:.1}s",
                    job.registration, job.source, accepted, duration
                );
                Ok(ProcessOutcome::Completed {
                    photos_found: accepted,
                })
            }
            Err(ScrapeFailure::Blocked(reason)) => {
                self.jobs
                    .finish(
                        job.id,
                        JobTransition::blocked(reason.clone()),
                        Some(RunOutcome::failed(&run, reason.clone(), now)),
                    )
                    .await?;
                counter!(JOBS_BLOCKED, "source" => job.source.clone()).increment(1);
                warn!(
                    "Scrape blocked for {}/{}: {}",
                    job.registration, job.source, reason
                );
                Ok(ProcessOutcome::Blocked { reason })
            }
            Err(ScrapeFailure::Transient(reason)) => {
                self.jobs
                    .finish(
                        job.id,
                        JobTransition::failed(reason.clone(), now + self.failure_backoff),
                        Some(RunOutcome::failed(&run, reason.clone(), now)),
                    )
                    .await?;
                counter!(JOBS_FAILED, "source" => job.source.clone()).increment(1);
                error!(
                    "Scrape failed for {}/{}: {}",
                    job.registration, job.source, reason
                );
                Ok(ProcessOutcome::Failed { reason })
            }
        }
    }

    async fn scrape(&self, job: &ScrapeJob) -> Result<ScrapeStep, ScrapeFailure> {
        let scraper = self
            .scrapers
            .get(&job.source)
            .map_err(|e| ScrapeFailure::Transient(e.to_string()))?;

        self.rate_limiter
            .acquire(&job.source)
            .await
            .map_err(|e| ScrapeFailure::Transient(e.to_string()))?;

        if self.control().is_paused().await.map_err(transient)? {
            return Ok(ScrapeStep::Paused);
        }

        let flights = self
            .flights
            .find_by_registration(&job.registration)
            .await
            .map_err(transient)?;
        let filter = PlausibilityFilter::from_flights(&flights);
        let hints = (!filter.airports().is_empty()).then_some(filter.airports());

        let scraped = scraper
            .scrape(&job.registration, hints)
            .await
            .map_err(|e| {
                if e.is_permanent() {
                    ScrapeFailure::Blocked(e.to_string())
                } else {
                    ScrapeFailure::Transient(e.to_string())
                }
            })?;

        let mut accepted = 0;
        let mut filtered = 0;
        for photo in scraped {
            if !filter.accepts(&photo) {
                filtered += 1;
                continue;
            }
            if self
                .photos
                .photo_exists(&photo.source, &photo.source_photo_id)
                .await
                .map_err(transient)?
            {
                continue;
            }
            self.photos
                .create_photo(&CandidatePhoto::from(photo))
                .await
                .map_err(transient)?;
            accepted += 1;
        }

        counter!(PHOTOS_ACCEPTED, "source" => job.source.clone()).increment(accepted as u64);
        counter!(PHOTOS_FILTERED, "source" => job.source.clone()).increment(filtered as u64);
        if filtered > 0 {
            info!(
                "Filtered {} non-matching photos for {}",
                filtered, job.registration
            );
        }

        let matches = self
            .matcher
            .match_registration(&job.registration)
            .await
            .map_err(transient)?;
        counter!(MATCHES_CREATED).increment(matches.len() as u64);

        Ok(ScrapeStep::Stored { accepted })
    }
}

fn transient(e: impl std::fmt::Display) -> ScrapeFailure {
    ScrapeFailure::Transient(e.to_string())
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod tests;
