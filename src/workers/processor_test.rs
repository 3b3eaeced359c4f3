use super::*;
use crate::domain::models::flight::Flight;
use crate::domain::models::photo::ScrapedPhoto;
use crate::domain::models::scrape_job::RunStatus;
use crate::domain::services::coordination::CoordinationStore;
use crate::domain::services::queue_control::SettingsUpdate;
use crate::domain::services::rate_limiter::RateLimitPolicy;
use crate::infrastructure::database::entities::scrape_run;
use crate::test_support::{StubBehavior, StubScraper, TestContext};
use chrono::{DateTime, NaiveDate};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::collections::{BTreeSet, HashMap};

fn ymd(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn scraped(id: &str, date: u32, airport: &str) -> ScrapedPhoto {
    ScrapedPhoto {
        source: "jetphotos".to_string(),
        source_photo_id: id.to_string(),
        source_url: format!("https://example.test/photo/{}", id),
        thumbnail_url: None,
        full_image_url: None,
        registration: "N506DN".to_string(),
        airport_code: Some(airport.to_string()),
        photo_date: Some(ymd(date)),
        photographer: Some("spotter".to_string()),
    }
}

async fn seed_flight(ctx: &TestContext) {
    let mut flight = Flight::new(Uuid::new_v4(), ymd(1));
    flight.registration = Some("N506DN".to_string());
    flight.departure_airport_iata = Some("JFK".to_string());
    flight.departure_airport_icao = Some("KJFK".to_string());
    flight.arrival_airport_iata = Some("LHR".to_string());
    flight.arrival_airport_icao = Some("EGLL".to_string());
    ctx.flights.create(&flight).await.unwrap();
}

fn processor(ctx: &TestContext, scraper: Arc<StubScraper>) -> ScrapeJobProcessor {
    ScrapeJobProcessor::new(
        ctx.jobs.clone(),
        ctx.flights.clone(),
        ctx.photos.clone(),
        ScraperRegistry::new().with(scraper),
        ctx.rate_limiter(),
        ctx.dispatcher.clone(),
        chrono::Duration::hours(1),
    )
}

async fn new_job(ctx: &TestContext, source: &str) -> ScrapeJob {
    let job = ScrapeJob::new("N506DN", source);
    ctx.jobs.create(&job).await.unwrap();
    job
}

fn hours_from_now(at: DateTime<chrono::FixedOffset>) -> i64 {
    (at.with_timezone(&Utc) - Utc::now()).num_minutes().div_euclid(60) + 1
}

#[tokio::test]
async fn test_completed_job_keeps_only_plausible_photos_and_matches_them() {
    let ctx = TestContext::new().await;
    seed_flight(&ctx).await;
    let scraper = StubScraper::new(
        "jetphotos",
        StubBehavior::Photos(vec![
            scraped("1", 1, "jfk"),
            scraped("2", 1, "CDG"),
            scraped("3", 10, "JFK"),
        ]),
    );
    let job = new_job(&ctx, "jetphotos").await;

    let outcome = processor(&ctx, scraper.clone()).process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Completed { photos_found: 1 });

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.photos_found, 1);
    assert!(stored.error_message.is_none());
    assert!(stored.last_scraped_at.is_some());
    assert_eq!(hours_from_now(stored.next_scrape_after.unwrap()), 168);
    assert!(ctx.jobs.latest_running_run(job.id).await.unwrap().is_none());

    let hints = scraper.hints();
    let expected: BTreeSet<String> = ["EGLL", "JFK", "KJFK", "LHR"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(hints, vec![Some(expected)]);

    let photos = ctx.photos.find_photos_by_registration("N506DN").await.unwrap();
    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].source_photo_id, "1");
    let matches = ctx.photos.find_matches_by_photo(photos[0].id).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_score, 100);
}

#[tokio::test]
async fn test_rescrape_does_not_duplicate_photos_or_matches() {
    let ctx = TestContext::new().await;
    seed_flight(&ctx).await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(vec![scraped("1", 1, "JFK")]));
    let job = new_job(&ctx, "jetphotos").await;
    let processor = processor(&ctx, scraper);

    processor.process(job.id).await;
    ctx.jobs
        .requeue_registration("N506DN", Utc::now())
        .await
        .unwrap();
    let outcome = processor.process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Completed { photos_found: 0 });

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.photos_found, 1);
    let photos = ctx.photos.find_photos_by_registration("N506DN").await.unwrap();
    assert_eq!(photos.len(), 1);
    let matches = ctx.photos.find_matches_by_photo(photos[0].id).await.unwrap();
    assert_eq!(matches.len(), 1);
}

#[tokio::test]
async fn test_no_flights_means_no_hints_and_no_photos() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(vec![scraped("1", 1, "JFK")]));
    let job = new_job(&ctx, "jetphotos").await;

    let outcome = processor(&ctx, scraper.clone()).process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Completed { photos_found: 0 });
    assert_eq!(scraper.hints(), vec![None]);
}

#[tokio::test]
async fn test_zero_rescan_interval_leaves_completed_job_unscheduled() {
    let ctx = TestContext::new().await;
    ctx.control
        .apply_settings(SettingsUpdate {
            rescan_interval_hours: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(Vec::new()));
    let job = new_job(&ctx, "jetphotos").await;

    processor(&ctx, scraper).process(job.id).await;

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(stored.next_scrape_after.is_none());
}

#[tokio::test]
async fn test_permanent_block_is_never_rescheduled() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Block("cloudflare".to_string()));
    let job = new_job(&ctx, "jetphotos").await;

    let outcome = processor(&ctx, scraper).process(job.id).await;
    assert!(matches!(outcome, ProcessOutcome::Blocked { .. }));

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Blocked);
    assert!(stored.next_scrape_after.is_none());
    assert!(stored.error_message.unwrap().contains("cloudflare"));
}

#[tokio::test]
async fn test_transient_failure_backs_off_one_hour() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Fail("timeout".to_string()));
    let job = new_job(&ctx, "jetphotos").await;

    let outcome = processor(&ctx, scraper).process(job.id).await;
    assert!(matches!(outcome, ProcessOutcome::Failed { .. }));

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(hours_from_now(stored.next_scrape_after.unwrap()), 1);
    assert!(stored.error_message.unwrap().contains("timeout"));
    assert!(ctx.jobs.latest_running_run(job.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_source_fails_job() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(Vec::new()));
    let job = new_job(&ctx, "flickr").await;

    let outcome = processor(&ctx, scraper).process(job.id).await;
    assert_eq!(
        outcome,
        ProcessOutcome::Failed {
            reason: "Unknown source: flickr".to_string()
        }
    );
}

#[tokio::test]
async fn test_running_job_is_a_duplicate_and_not_scraped() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(Vec::new()));
    let job = new_job(&ctx, "jetphotos").await;
    ctx.jobs.start_run(job.id).await.unwrap().unwrap();

    let outcome = processor(&ctx, scraper.clone()).process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Duplicate);
    assert_eq!(scraper.calls(), 0);
}

#[tokio::test]
async fn test_paused_queue_resets_job_without_scraping() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(Vec::new()));
    let mut job = ScrapeJob::new("N506DN", "jetphotos");
    job.status = JobStatus::Completed;
    ctx.jobs.create(&job).await.unwrap();
    ctx.control.pause().await.unwrap();

    let outcome = processor(&ctx, scraper.clone()).process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Paused);
    assert_eq!(scraper.calls(), 0);

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert!(ctx.queue.submitted().is_empty());
}

#[tokio::test]
async fn test_blocked_job_dispatched_twice_is_scraped_once() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Block("cloudflare".to_string()));
    let job = new_job(&ctx, "jetphotos").await;
    let processor = processor(&ctx, scraper.clone());

    let first = processor.process(job.id).await;
    assert!(matches!(first, ProcessOutcome::Blocked { .. }));
    let second = processor.process(job.id).await;
    assert_eq!(second, ProcessOutcome::Duplicate);
    assert_eq!(scraper.calls(), 1);

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Blocked);
    assert!(stored.next_scrape_after.is_none());
}

#[tokio::test]
async fn test_completed_job_is_not_rescraped_before_it_is_due() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(Vec::new()));
    let job = new_job(&ctx, "jetphotos").await;
    let processor = processor(&ctx, scraper.clone());

    processor.process(job.id).await;
    let outcome = processor.process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Duplicate);
    assert_eq!(scraper.calls(), 1);

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(hours_from_now(stored.next_scrape_after.unwrap()), 168);
}

#[tokio::test]
async fn test_pause_does_not_reopen_blocked_job() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Block("cloudflare".to_string()));
    let job = new_job(&ctx, "jetphotos").await;
    let processor = processor(&ctx, scraper.clone());
    processor.process(job.id).await;

    ctx.control.pause().await.unwrap();
    let outcome = processor.process(job.id).await;
    assert_eq!(outcome, ProcessOutcome::Duplicate);
    assert_eq!(scraper.calls(), 1);

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Blocked);
    assert!(stored.next_scrape_after.is_none());
    assert!(stored.error_message.unwrap().contains("cloudflare"));
}

#[tokio::test]
async fn test_pause_while_waiting_for_rate_limit_closes_run_as_paused() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(vec![scraped("1", 1, "JFK")]));
    let job = new_job(&ctx, "jetphotos").await;
    let limiter = Arc::new(SourceRateLimiter::new(
        ctx.store.clone(),
        HashMap::from([("jetphotos".to_string(), RateLimitPolicy::new(1, 1))]),
        std::time::Duration::from_millis(10),
    ));
    let processor = ScrapeJobProcessor::new(
        ctx.jobs.clone(),
        ctx.flights.clone(),
        ctx.photos.clone(),
        ScraperRegistry::new().with(scraper.clone()),
        limiter,
        ctx.dispatcher.clone(),
        chrono::Duration::hours(1),
    );
    // fill the window so the worker waits after claiming the job
    assert!(ctx
        .store
        .try_acquire_window("ratelimit:jetphotos", std::time::Duration::from_secs(1), 1)
        .await
        .unwrap());

    let (outcome, _) = tokio::join!(processor.process(job.id), async {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        ctx.control.pause().await.unwrap();
    });
    assert_eq!(outcome, ProcessOutcome::Paused);
    assert_eq!(scraper.calls(), 0);

    let stored = ctx.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert!(ctx.jobs.latest_running_run(job.id).await.unwrap().is_none());

    let runs = scrape_run::Entity::find()
        .filter(scrape_run::Column::JobId.eq(job.id))
        .all(ctx.db.as_ref())
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed.to_string());
    assert_eq!(runs[0].error_message.as_deref(), Some("Paused"));
    assert!(runs[0].finished_at.is_some());
    assert!(ctx.photos.find_photos_by_registration("N506DN").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_job_still_refills_slots() {
    let ctx = TestContext::new().await;
    let scraper = StubScraper::new("jetphotos", StubBehavior::Photos(Vec::new()));
    new_job(&ctx, "jetphotos").await;
    new_job(&ctx, "airlinersnet").await;

    let outcome = processor(&ctx, scraper).process(Uuid::new_v4()).await;
    assert_eq!(outcome, ProcessOutcome::NotFound);

    let submitted = ctx.queue.submitted();
    assert_eq!(submitted.len(), 2);
    assert!(submitted
        .iter()
        .all(|(_, delay)| *delay == std::time::Duration::from_secs(5)));
}
