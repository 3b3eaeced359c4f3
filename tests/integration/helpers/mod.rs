// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tailspotter::application::usecases::import_flights::FlightImporter;
use tailspotter::application::usecases::queue_admin::QueueAdmin;
use tailspotter::domain::models::flight::Flight;
use tailspotter::domain::models::photo::ScrapedPhoto;
use tailspotter::domain::services::queue_control::QueueControl;
use tailspotter::domain::services::rate_limiter::SourceRateLimiter;
use tailspotter::engines::registry::ScraperRegistry;
use tailspotter::engines::traits::{PhotoScraper, ScraperError};
use tailspotter::infrastructure::cache::memory_store::MemoryCoordinationStore;
use tailspotter::infrastructure::repositories::flight_repo_impl::FlightRepositoryImpl;
use tailspotter::infrastructure::repositories::photo_repo_impl::PhotoRepositoryImpl;
use tailspotter::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use tailspotter::queue::dispatcher::Dispatcher;
use tailspotter::queue::job_queue::{ChannelJobQueue, JobReceiver};
use tailspotter::workers::processor::ScrapeJobProcessor;
use uuid::Uuid;

/// 为每个注册号返回一张在航班当天、出发机场拍摄的照片
pub struct FixtureScraper {
    source: String,
    date: NaiveDate,
    airport: String,
    calls: AtomicUsize,
}

impl FixtureScraper {
    pub fn new(source: &str, date: NaiveDate, airport: &str) -> Arc<Self> {
        Arc::new(Self {
            source: source.to_string(),
            date,
            airport: airport.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhotoScraper for FixtureScraper {
    fn source(&self) -> &str {
        &self.source
    }

    async fn scrape(
        &self,
        registration: &str,
        _airport_hints: Option<&BTreeSet<String>>,
    ) -> Result<Vec<ScrapedPhoto>, ScraperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(vec![ScrapedPhoto {
            source: self.source.clone(),
            source_photo_id: format!("{}-{}", self.source, registration),
            source_url: format!("https://photos.example/{}", registration),
            thumbnail_url: None,
            full_image_url: None,
            registration: registration.to_string(),
            airport_code: Some(self.airport.clone()),
            photo_date: Some(self.date),
            photographer: Some("fixture".to_string()),
        }])
    }
}

/// 完整装配的调度器：sqlite 内存库、进程内协调存储和通道队列
pub struct TestApp {
    pub jobs: Arc<ScrapeJobRepositoryImpl>,
    pub flights: Arc<FlightRepositoryImpl>,
    pub photos: Arc<PhotoRepositoryImpl>,
    pub control: QueueControl,
    pub dispatcher: Arc<Dispatcher>,
    pub receiver: JobReceiver,
    pub store: Arc<MemoryCoordinationStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let db = Arc::new(db);

        let store = Arc::new(MemoryCoordinationStore::new());
        let control = QueueControl::new(store.clone(), "ts:");
        let jobs = Arc::new(ScrapeJobRepositoryImpl::new(db.clone()));
        let (queue, receiver) = ChannelJobQueue::channel();
        let dispatcher = Arc::new(Dispatcher::new(
            jobs.clone(),
            Arc::new(queue),
            control.clone(),
            false,
        ));

        Self {
            jobs,
            flights: Arc::new(FlightRepositoryImpl::new(db.clone())),
            photos: Arc::new(PhotoRepositoryImpl::new(db)),
            control,
            dispatcher,
            receiver,
            store,
        }
    }

    pub fn processor(&self, scrapers: ScraperRegistry) -> Arc<ScrapeJobProcessor> {
        let rate_limiter = Arc::new(SourceRateLimiter::new(
            self.store.clone(),
            HashMap::new(),
            Duration::from_millis(10),
        ));
        Arc::new(ScrapeJobProcessor::new(
            self.jobs.clone(),
            self.flights.clone(),
            self.photos.clone(),
            scrapers,
            rate_limiter,
            self.dispatcher.clone(),
            chrono::Duration::hours(1),
        ))
    }

    pub fn importer(&self, sources: &[&str]) -> Arc<FlightImporter> {
        Arc::new(FlightImporter::new(
            self.flights.clone(),
            self.jobs.clone(),
            self.dispatcher.clone(),
            sources.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn admin(&self) -> Arc<QueueAdmin> {
        Arc::new(QueueAdmin::new(
            self.jobs.clone(),
            self.flights.clone(),
            self.photos.clone(),
            self.dispatcher.clone(),
        ))
    }
}

pub fn flight(date: NaiveDate, registration: &str) -> Flight {
    let mut flight = Flight::new(Uuid::new_v4(), date);
    flight.flight_number = Some("BA117".to_string());
    flight.departure_airport_iata = Some("LHR".to_string());
    flight.arrival_airport_iata = Some("JFK".to_string());
    flight.registration = Some(registration.to_string());
    flight
}
