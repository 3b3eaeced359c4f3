// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{flight, FixtureScraper, TestApp};
use chrono::NaiveDate;
use std::time::Duration;
use tailspotter::domain::models::scrape_job::JobStatus;
use tailspotter::domain::repositories::photo_repository::PhotoRepository;
use tailspotter::domain::repositories::scrape_job_repository::ScrapeJobRepository;
use tailspotter::domain::services::queue_control::SettingsUpdate;
use tailspotter::engines::registry::ScraperRegistry;
use tailspotter::workers::manager::WorkerManager;
use uuid::Uuid;

/// 等待直到恰好 `expected` 个作业完成且没有作业在运行
async fn wait_for_completed(app: &TestApp, expected: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        let completed = app.jobs.count_by_status(JobStatus::Completed).await.unwrap();
        let running = app.jobs.count_by_status(JobStatus::Running).await.unwrap();
        if completed == expected && running == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// 导入后调度链在并发上限内逐个处理所有作业，直到队列清空
#[tokio::test]
async fn test_import_drains_queue_through_self_scheduling() {
    let app = TestApp::new().await;
    app.control
        .apply_settings(SettingsUpdate {
            max_jobs: Some(2),
            job_delay_seconds: Some(0),
            rescan_interval_hours: None,
        })
        .await
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let scraper = FixtureScraper::new("jetphotos", date, "LHR");
    let processor = app.processor(ScraperRegistry::new().with(scraper.clone()));

    let mut manager = WorkerManager::new(app.receiver.clone(), processor);
    manager.start_workers(4);

    let registrations = ["G-XLEA", "G-XLEB", "G-XLEC", "G-XLED", "G-XLEE"];
    let flights = registrations
        .iter()
        .map(|registration| flight(date, registration))
        .collect();
    let summary = app
        .importer(&["jetphotos"])
        .import(flights, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(summary.jobs_created, 5);

    assert!(wait_for_completed(&app, 5).await, "queue did not drain");
    manager.shutdown();

    assert_eq!(app.jobs.count_by_status(JobStatus::Pending).await.unwrap(), 0);
    // duplicate dispatches of a finished job are dropped
    assert_eq!(scraper.calls(), 5);

    for registration in registrations {
        let photos = app.photos.find_photos_by_registration(registration).await.unwrap();
        assert_eq!(photos.len(), 1);
        let matches = app.photos.find_matches_by_photo(photos[0].id).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_score, 100);
    }

    let completed = app.jobs.find_by_status(JobStatus::Completed).await.unwrap();
    assert!(completed.iter().all(|job| job.next_scrape_after.is_some()));
}

/// 暂停时已入队的作业退回 pending，恢复后继续处理
#[tokio::test]
async fn test_pause_holds_jobs_until_resume() {
    let app = TestApp::new().await;
    app.control.pause().await.unwrap();

    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let scraper = FixtureScraper::new("jetphotos", date, "LHR");
    let processor = app.processor(ScraperRegistry::new().with(scraper.clone()));
    let mut manager = WorkerManager::new(app.receiver.clone(), processor);
    manager.start_workers(2);

    app.importer(&["jetphotos"])
        .import(vec![flight(date, "N506DN")], Uuid::new_v4())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(scraper.calls(), 0);
    assert_eq!(app.jobs.count_by_status(JobStatus::Pending).await.unwrap(), 1);

    let submitted = app.admin().resume().await.unwrap();
    assert_eq!(submitted, 1);
    assert!(wait_for_completed(&app, 1).await, "job did not complete after resume");
    manager.shutdown();

    assert_eq!(scraper.calls(), 1);
}
