// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flight::Flight;
use crate::domain::models::scrape_job::ScrapeJob;
use crate::domain::repositories::flight_repository::FlightRepository;
use crate::domain::repositories::scrape_job_repository::{RepositoryError, ScrapeJobRepository};
use crate::queue::dispatcher::Dispatcher;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 导入结果
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportSummary {
    pub flights_imported: usize,
    pub flights_skipped: usize,
    /// 新航班涉及的不同注册号数量
    pub registrations: usize,
    pub jobs_created: usize,
    pub batch_id: Uuid,
}

/// 航班导入用例
///
/// 去重并保存航班，为新出现的注册号在每个来源上各建一个待调度作业，
/// 最后播种分发器。
pub struct FlightImporter {
    flights: Arc<dyn FlightRepository>,
    jobs: Arc<dyn ScrapeJobRepository>,
    dispatcher: Arc<Dispatcher>,
    sources: Vec<String>,
}

impl FlightImporter {
    /// 创建导入用例
    ///
    /// # 参数
    ///
    /// * `flights` - 航班仓库
    /// * `jobs` - 作业仓库
    /// * `dispatcher` - 分发器
    /// * `sources` - 需要建作业的照片来源，按顺序创建
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        jobs: Arc<dyn ScrapeJobRepository>,
        dispatcher: Arc<Dispatcher>,
        sources: Vec<String>,
    ) -> Self {
        Self {
            flights,
            jobs,
            dispatcher,
            sources,
        }
    }

    /// 导入一批航班
    ///
    /// 已存在的航班（日期、航班号、注册号和两端机场一致，机场按 IATA 或
    /// ICAO 任一匹配）会被跳过。播种失败只记录警告，作业由清扫器兜底。
    pub async fn import(
        &self,
        flights: Vec<Flight>,
        batch_id: Uuid,
    ) -> Result<ImportSummary, RepositoryError> {
        let mut imported = Vec::new();
        let mut skipped = 0;
        for flight in flights {
            if self.flights.exists_duplicate(&flight).await? {
                skipped += 1;
                continue;
            }
            self.flights.create(&flight).await?;
            imported.push(flight);
        }

        let registrations: BTreeSet<&str> = imported
            .iter()
            .filter_map(|f| f.registration.as_deref())
            .collect();
        let jobs_created = self.create_jobs(&registrations).await?;

        match self.dispatcher.seed().await {
            Ok(submitted) => info!("Seeded {} jobs after import {}", submitted, batch_id),
            Err(e) => warn!("Failed to enqueue scrape jobs after import {}: {}", batch_id, e),
        }

        info!(
            "Imported batch {}: {} flights, {} skipped, {} new jobs",
            batch_id,
            imported.len(),
            skipped,
            jobs_created
        );

        Ok(ImportSummary {
            flights_imported: imported.len(),
            flights_skipped: skipped,
            registrations: registrations.len(),
            jobs_created,
            batch_id,
        })
    }

    async fn create_jobs(&self, registrations: &BTreeSet<&str>) -> Result<usize, RepositoryError> {
        let mut created = 0;
        for registration in registrations {
            for source in &self.sources {
                if self.jobs.exists(registration, source).await? {
                    continue;
                }
                self.jobs
                    .create(&ScrapeJob::new(*registration, source.as_str()))
                    .await?;
                created += 1;
            }
        }
        Ok(created)
    }
}
