// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_job::{JobStatus, RunStatus, ScrapeJob, ScrapeRun};
use crate::domain::repositories::scrape_job_repository::{
    JobTransition, RepositoryError, RunOutcome, ScrapeJobRepository, UpcomingRescans,
};
use crate::infrastructure::database::entities::{scrape_job as job_entity, scrape_run as run_entity};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取作业仓库实现
///
/// 基于SeaORM实现的作业与执行记录数据访问层
#[derive(Clone)]
pub struct ScrapeJobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapeJobRepositoryImpl {
    /// 创建新的作业仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<job_entity::Model> for ScrapeJob {
    fn from(model: job_entity::Model) -> Self {
        Self {
            id: model.id,
            registration: model.registration,
            source: model.source,
            status: model.status.parse().unwrap_or_default(),
            priority: model.priority,
            photos_found: model.photos_found,
            last_scraped_at: model.last_scraped_at,
            next_scrape_after: model.next_scrape_after,
            error_message: model.error_message,
            created_at: model.created_at,
        }
    }
}

impl From<&ScrapeJob> for job_entity::ActiveModel {
    fn from(job: &ScrapeJob) -> Self {
        Self {
            id: Set(job.id),
            registration: Set(job.registration.clone()),
            source: Set(job.source.clone()),
            status: Set(job.status.to_string()),
            priority: Set(job.priority),
            photos_found: Set(job.photos_found),
            last_scraped_at: Set(job.last_scraped_at),
            next_scrape_after: Set(job.next_scrape_after),
            error_message: Set(job.error_message.clone()),
            created_at: Set(job.created_at),
        }
    }
}

impl From<run_entity::Model> for ScrapeRun {
    fn from(model: run_entity::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            source: model.source,
            registration: model.registration,
            status: model.status.parse().unwrap_or_default(),
            photos_found: model.photos_found,
            duration_seconds: model.duration_seconds,
            error_message: model.error_message,
            started_at: model.started_at,
            finished_at: model.finished_at,
        }
    }
}

impl From<&ScrapeRun> for run_entity::ActiveModel {
    fn from(run: &ScrapeRun) -> Self {
        Self {
            id: Set(run.id),
            job_id: Set(run.job_id),
            source: Set(run.source.clone()),
            registration: Set(run.registration.clone()),
            status: Set(run.status.to_string()),
            photos_found: Set(run.photos_found),
            duration_seconds: Set(run.duration_seconds),
            error_message: Set(run.error_message.clone()),
            started_at: Set(run.started_at),
            finished_at: Set(run.finished_at),
        }
    }
}

fn dispatchable_statuses() -> Vec<String> {
    JobStatus::DISPATCHABLE
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn to_fixed(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.into()
}

/// 可调度且已到期，与 `ScrapeJob::is_dispatchable_at` 一致
fn due_at(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(job_entity::Column::Status.is_in(dispatchable_statuses()))
        .add(job_entity::Column::NextScrapeAfter.lte(to_fixed(now)))
}

#[async_trait]
impl ScrapeJobRepository for ScrapeJobRepositoryImpl {
    async fn create(&self, job: &ScrapeJob) -> Result<(), RepositoryError> {
        let model: job_entity::ActiveModel = job.into();
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScrapeJob>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn exists(&self, registration: &str, source: &str) -> Result<bool, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::Registration.eq(registration))
            .filter(job_entity::Column::Source.eq(source))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<ScrapeJob>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(status.to_string()))
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(ScrapeJob::from).collect())
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(status.to_string()))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn count_ready_pending(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Pending.to_string()))
            .filter(job_entity::Column::NextScrapeAfter.lte(to_fixed(now)))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn find_dispatchable(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ScrapeJob>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(due_at(now))
            .order_by_desc(job_entity::Column::Priority)
            .order_by_asc(job_entity::Column::CreatedAt)
            .order_by_asc(job_entity::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(ScrapeJob::from).collect())
    }

    async fn start_run(
        &self,
        job_id: Uuid,
    ) -> Result<Option<(ScrapeJob, ScrapeRun)>, RepositoryError> {
        let txn = self.db.begin().await?;

        // conditional transition: a duplicate dispatch that lost the race,
        // or arrives after the job left the dispatchable set, updates nothing
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Running.to_string()),
            )
            .filter(job_entity::Column::Id.eq(job_id))
            .filter(due_at(Utc::now()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.commit().await?;
            return Ok(None);
        }

        let job: ScrapeJob = job_entity::Entity::find_by_id(job_id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .into();

        let run = ScrapeRun::start(&job);
        let run_model: run_entity::ActiveModel = (&run).into();
        run_model.insert(&txn).await?;

        txn.commit().await?;
        Ok(Some((job, run)))
    }

    async fn finish(
        &self,
        job_id: Uuid,
        transition: JobTransition,
        run: Option<RunOutcome>,
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let job = job_entity::Entity::find_by_id(job_id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let photos_found = job.photos_found + transition.photos_added;
        let mut active: job_entity::ActiveModel = job.into();
        active.status = Set(transition.status.to_string());
        active.next_scrape_after = Set(transition.next_scrape_after);
        active.error_message = Set(transition.error_message);
        active.photos_found = Set(photos_found);
        if let Some(scraped_at) = transition.scraped_at {
            active.last_scraped_at = Set(Some(scraped_at));
        }
        active.update(&txn).await?;

        if let Some(outcome) = run {
            let run = run_entity::Entity::find_by_id(outcome.run_id)
                .one(&txn)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            // a reset may already have closed this run
            if run.finished_at.is_some() {
                txn.commit().await?;
                return Ok(());
            }
            let mut active: run_entity::ActiveModel = run.into();
            active.status = Set(outcome.status.to_string());
            active.photos_found = Set(outcome.photos_found);
            active.duration_seconds = Set(outcome.duration_seconds);
            active.error_message = Set(outcome.error_message);
            active.finished_at = Set(Some(outcome.finished_at));
            active.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    async fn release_to_pending(
        &self,
        job_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Pending.to_string()),
            )
            .col_expr(
                job_entity::Column::NextScrapeAfter,
                Expr::value(Some(to_fixed(now))),
            )
            .col_expr(
                job_entity::Column::ErrorMessage,
                Expr::value(Option::<String>::None),
            )
            .filter(job_entity::Column::Id.eq(job_id))
            .filter(due_at(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn latest_running_run(
        &self,
        job_id: Uuid,
    ) -> Result<Option<ScrapeRun>, RepositoryError> {
        let model = run_entity::Entity::find()
            .filter(run_entity::Column::JobId.eq(job_id))
            .filter(run_entity::Column::Status.eq(RunStatus::Running.to_string()))
            .order_by_desc(run_entity::Column::StartedAt)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn requeue_running(
        &self,
        now: DateTime<Utc>,
        run_message: &str,
    ) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;

        let job_ids: Vec<Uuid> = job_entity::Entity::find()
            .select_only()
            .column(job_entity::Column::Id)
            .filter(job_entity::Column::Status.eq(JobStatus::Running.to_string()))
            .into_tuple()
            .all(&txn)
            .await?;

        if job_ids.is_empty() {
            txn.commit().await?;
            return Ok(0);
        }

        run_entity::Entity::update_many()
            .col_expr(
                run_entity::Column::Status,
                Expr::value(RunStatus::Failed.to_string()),
            )
            .col_expr(
                run_entity::Column::ErrorMessage,
                Expr::value(Some(run_message.to_string())),
            )
            .col_expr(
                run_entity::Column::FinishedAt,
                Expr::value(Some(to_fixed(now))),
            )
            .filter(run_entity::Column::JobId.is_in(job_ids.clone()))
            .filter(run_entity::Column::Status.eq(RunStatus::Running.to_string()))
            .exec(&txn)
            .await?;

        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Pending.to_string()),
            )
            .col_expr(
                job_entity::Column::NextScrapeAfter,
                Expr::value(Some(to_fixed(now))),
            )
            .col_expr(
                job_entity::Column::ErrorMessage,
                Expr::value(Option::<String>::None),
            )
            .filter(job_entity::Column::Id.is_in(job_ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(result.rows_affected)
    }

    async fn requeue_status(
        &self,
        status: JobStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScrapeJob>, RepositoryError> {
        let txn = self.db.begin().await?;

        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(status.to_string()))
            .order_by_desc(job_entity::Column::Priority)
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(&txn)
            .await?;

        let jobs = requeue_models(&txn, models, now).await?;
        txn.commit().await?;
        Ok(jobs)
    }

    async fn requeue_registration(
        &self,
        registration: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScrapeJob>, RepositoryError> {
        let txn = self.db.begin().await?;

        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Registration.eq(registration))
            .filter(job_entity::Column::Status.ne(JobStatus::Running.to_string()))
            .order_by_asc(job_entity::Column::CreatedAt)
            .all(&txn)
            .await?;

        let jobs = requeue_models(&txn, models, now).await?;
        txn.commit().await?;
        Ok(jobs)
    }

    async fn reschedule_completed(&self, rescan_hours: u32) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;

        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Completed.to_string()))
            .all(&txn)
            .await?;

        let mut updated = 0;
        for model in models {
            let next = model
                .last_scraped_at
                .filter(|_| rescan_hours > 0)
                .map(|last| last + Duration::hours(i64::from(rescan_hours)));
            let mut active: job_entity::ActiveModel = model.into();
            active.next_scrape_after = Set(next);
            active.update(&txn).await?;
            updated += 1;
        }

        txn.commit().await?;
        Ok(updated)
    }

    async fn average_success_duration(&self) -> Result<Option<f64>, RepositoryError> {
        let durations: Vec<Option<f64>> = run_entity::Entity::find()
            .select_only()
            .column(run_entity::Column::DurationSeconds)
            .filter(run_entity::Column::Status.eq(RunStatus::Success.to_string()))
            .filter(run_entity::Column::DurationSeconds.is_not_null())
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let durations: Vec<f64> = durations.into_iter().flatten().collect();
        if durations.is_empty() {
            return Ok(None);
        }
        Ok(Some(durations.iter().sum::<f64>() / durations.len() as f64))
    }

    async fn upcoming_rescans(
        &self,
        now: DateTime<Utc>,
    ) -> Result<UpcomingRescans, RepositoryError> {
        let query = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(JobStatus::Completed.to_string()))
            .filter(job_entity::Column::NextScrapeAfter.is_not_null())
            .filter(job_entity::Column::NextScrapeAfter.gt(to_fixed(now)));

        let count = query.clone().count(self.db.as_ref()).await?;
        let earliest = query
            .order_by_asc(job_entity::Column::NextScrapeAfter)
            .one(self.db.as_ref())
            .await?;

        Ok(UpcomingRescans {
            count,
            next_at: earliest.and_then(|model| model.next_scrape_after),
        })
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let txn = self.db.begin().await?;
        run_entity::Entity::delete_many().exec(&txn).await?;
        let result = job_entity::Entity::delete_many().exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }
}

/// 将作业恢复为立即可调度的待处理状态并清除错误信息
async fn requeue_models<C: sea_orm::ConnectionTrait>(
    conn: &C,
    models: Vec<job_entity::Model>,
    now: DateTime<Utc>,
) -> Result<Vec<ScrapeJob>, RepositoryError> {
    let mut jobs = Vec::with_capacity(models.len());
    for model in models {
        let mut active: job_entity::ActiveModel = model.into();
        active.status = Set(JobStatus::Pending.to_string());
        active.next_scrape_after = Set(Some(to_fixed(now)));
        active.error_message = Set(None);
        let updated = active.update(conn).await?;
        jobs.push(updated.into());
    }
    Ok(jobs)
}
