// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 单元测试共用的装配：内存 sqlite、内存协调存储、记录型队列与桩抓取器。

use crate::domain::models::photo::ScrapedPhoto;
use crate::domain::services::queue_control::QueueControl;
use crate::domain::services::rate_limiter::SourceRateLimiter;
use crate::engines::traits::{PhotoScraper, ScraperError};
use crate::infrastructure::cache::memory_store::MemoryCoordinationStore;
use crate::infrastructure::repositories::flight_repo_impl::FlightRepositoryImpl;
use crate::infrastructure::repositories::photo_repo_impl::PhotoRepositoryImpl;
use crate::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use crate::queue::dispatcher::Dispatcher;
use crate::queue::job_queue::{JobQueue, QueueError};
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// 只记录提交的队列
#[derive(Default)]
pub struct RecordingJobQueue {
    submitted: Mutex<Vec<(Uuid, Duration)>>,
}

impl RecordingJobQueue {
    pub fn submitted(&self) -> Vec<(Uuid, Duration)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_ids(&self) -> Vec<Uuid> {
        self.submitted().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl JobQueue for RecordingJobQueue {
    async fn submit(&self, job_id: Uuid, delay: Duration) -> Result<(), QueueError> {
        self.submitted.lock().unwrap().push((job_id, delay));
        Ok(())
    }
}

pub enum StubBehavior {
    Photos(Vec<ScrapedPhoto>),
    Block(String),
    Fail(String),
}

/// 桩抓取器，记录调用次数与收到的机场提示
pub struct StubScraper {
    source: String,
    behavior: StubBehavior,
    calls: AtomicUsize,
    hints: Mutex<Vec<Option<BTreeSet<String>>>>,
}

impl StubScraper {
    pub fn new(source: &str, behavior: StubBehavior) -> Arc<Self> {
        Arc::new(Self {
            source: source.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn hints(&self) -> Vec<Option<BTreeSet<String>>> {
        self.hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoScraper for StubScraper {
    fn source(&self) -> &str {
        &self.source
    }

    async fn scrape(
        &self,
        _registration: &str,
        airport_hints: Option<&BTreeSet<String>>,
    ) -> Result<Vec<ScrapedPhoto>, ScraperError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hints.lock().unwrap().push(airport_hints.cloned());
        match &self.behavior {
            StubBehavior::Photos(photos) => Ok(photos.clone()),
            StubBehavior::Block(message) => Err(ScraperError::PermanentBlock(message.clone())),
            StubBehavior::Fail(message) => Err(ScraperError::Failed(message.clone())),
        }
    }
}

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub jobs: Arc<ScrapeJobRepositoryImpl>,
    pub flights: Arc<FlightRepositoryImpl>,
    pub photos: Arc<PhotoRepositoryImpl>,
    pub store: Arc<MemoryCoordinationStore>,
    pub control: QueueControl,
    pub queue: Arc<RecordingJobQueue>,
    pub dispatcher: Arc<Dispatcher>,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let db = Arc::new(db);

        let jobs = Arc::new(ScrapeJobRepositoryImpl::new(db.clone()));
        let flights = Arc::new(FlightRepositoryImpl::new(db.clone()));
        let photos = Arc::new(PhotoRepositoryImpl::new(db.clone()));
        let store = Arc::new(MemoryCoordinationStore::new());
        let control = QueueControl::new(store.clone(), "ts:");
        let queue = Arc::new(RecordingJobQueue::default());
        let dispatcher = Arc::new(Dispatcher::new(
            jobs.clone(),
            queue.clone(),
            control.clone(),
            true,
        ));

        Self {
            db,
            jobs,
            flights,
            photos,
            store,
            control,
            queue,
            dispatcher,
        }
    }

    /// 不做任何限流的限流器
    pub fn rate_limiter(&self) -> Arc<SourceRateLimiter> {
        Arc::new(SourceRateLimiter::new(
            self.store.clone(),
            HashMap::new(),
            Duration::from_millis(10),
        ))
    }
}
