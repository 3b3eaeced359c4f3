// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tailspotter::application::usecases::import_flights::FlightImporter;
use tailspotter::application::usecases::queue_admin::QueueAdmin;
use tailspotter::config::settings::Settings;
use tailspotter::domain::services::coordination::CoordinationStore;
use tailspotter::domain::services::queue_control::QueueControl;
use tailspotter::domain::services::rate_limiter::{RateLimitPolicy, SourceRateLimiter};
use tailspotter::engines::http_scraper::HttpPhotoScraper;
use tailspotter::engines::registry::ScraperRegistry;
use tailspotter::infrastructure::cache::memory_store::MemoryCoordinationStore;
use tailspotter::infrastructure::cache::redis_client::RedisCoordinationStore;
use tailspotter::infrastructure::database::connection;
use tailspotter::infrastructure::observability::metrics;
use tailspotter::infrastructure::repositories::flight_repo_impl::FlightRepositoryImpl;
use tailspotter::infrastructure::repositories::photo_repo_impl::PhotoRepositoryImpl;
use tailspotter::infrastructure::repositories::scrape_job_repo_impl::ScrapeJobRepositoryImpl;
use tailspotter::presentation::routes;
use tailspotter::queue::dispatcher::Dispatcher;
use tailspotter::queue::job_queue::ChannelJobQueue;
use tailspotter::utils::telemetry;
use tailspotter::workers::manager::WorkerManager;
use tailspotter::workers::processor::ScrapeJobProcessor;
use tailspotter::workers::sweeper::Sweeper;
use tokio::net::TcpListener;
use tracing::{info, warn};

use migration::{Migrator, MigratorTrait};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting tailspotter...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    if settings.metrics.enabled {
        metrics::init_metrics(settings.metrics.listen_address);
    }

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Coordination store
    let store: Arc<dyn CoordinationStore> = match &settings.redis.url {
        Some(url) => {
            info!("Using Redis coordination store");
            Arc::new(RedisCoordinationStore::new(url)?)
        }
        None => {
            warn!("No Redis URL configured, using in-process coordination store");
            Arc::new(MemoryCoordinationStore::new())
        }
    };
    let control = QueueControl::new(store.clone(), settings.redis.key_prefix.clone());

    // 5. Repositories and queue
    let jobs = Arc::new(ScrapeJobRepositoryImpl::new(db.clone()));
    let flights = Arc::new(FlightRepositoryImpl::new(db.clone()));
    let photos = Arc::new(PhotoRepositoryImpl::new(db.clone()));

    let (queue, receiver) = ChannelJobQueue::channel();
    let dispatcher = Arc::new(Dispatcher::new(
        jobs.clone(),
        Arc::new(queue),
        control,
        settings.scheduler.dispatch_stagger,
    ));

    // 6. Scrapers and rate limits
    let mut scrapers = ScraperRegistry::new();
    let mut policies = HashMap::new();
    for source in &settings.sources {
        scrapers.register(Arc::new(HttpPhotoScraper::new(
            source.name.clone(),
            &source.endpoint,
            Duration::from_secs(source.timeout_seconds),
        )?));
        policies.insert(
            source.name.clone(),
            RateLimitPolicy::new(source.max_requests, source.window_seconds),
        );
    }
    let source_names: Vec<String> = scrapers.sources().to_vec();
    info!("Registered scrapers: {}", source_names.join(", "));

    let rate_limiter = Arc::new(SourceRateLimiter::new(
        store,
        policies,
        settings.scheduler.rate_limit_poll(),
    ));

    let processor = Arc::new(ScrapeJobProcessor::new(
        jobs.clone(),
        flights.clone(),
        photos.clone(),
        scrapers,
        rate_limiter,
        dispatcher.clone(),
        settings.scheduler.failure_backoff(),
    ));

    // 7. Recover from the previous process and start workers
    let sweeper = Sweeper::new(
        jobs.clone(),
        dispatcher.clone(),
        settings.scheduler.sweep_interval(),
        settings.scheduler.stale_run_timeout(),
        settings.scheduler.failure_backoff(),
    );
    sweeper
        .recover_on_startup(
            settings.scheduler.startup_attempts,
            settings.scheduler.startup_retry_delay(),
        )
        .await;

    let mut worker_manager = WorkerManager::new(receiver, processor);
    worker_manager.start_workers(settings.scheduler.worker_count);
    worker_manager.start_sweeper(sweeper);

    // 8. Start admin API
    let admin = Arc::new(QueueAdmin::new(
        jobs.clone(),
        flights.clone(),
        photos,
        dispatcher.clone(),
    ));
    let importer = Arc::new(FlightImporter::new(flights, jobs, dispatcher, source_names));
    let app = routes::app(admin, importer);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    worker_manager.wait_for_shutdown().await;
    server.abort();
    info!("tailspotter stopped");

    Ok(())
}
