// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const JOBS_DISPATCHED: &str = "scrape_jobs_dispatched_total";
pub const JOBS_COMPLETED: &str = "scrape_jobs_completed_total";
pub const JOBS_FAILED: &str = "scrape_jobs_failed_total";
pub const JOBS_BLOCKED: &str = "scrape_jobs_blocked_total";
pub const JOBS_REAPED: &str = "scrape_jobs_reaped_total";
pub const PHOTOS_ACCEPTED: &str = "scrape_photos_accepted_total";
pub const PHOTOS_FILTERED: &str = "scrape_photos_filtered_total";
pub const MATCHES_CREATED: &str = "photo_matches_created_total";
pub const JOB_DURATION: &str = "scrape_job_duration_seconds";

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册调度相关指标。
/// 端口被占用时只记录警告，调度照常运行。
pub fn init_metrics(listen_address: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new()
        .with_http_listener(listen_address)
        .install()
    {
        warn!(
            "Failed to install Prometheus recorder on {}: {}",
            listen_address, e
        );
        return;
    }
    describe_metrics();
    info!("Metrics exporter listening on {}", listen_address);
}

/// 注册指标描述
pub fn describe_metrics() {
    describe_counter!(JOBS_DISPATCHED, "Scrape jobs submitted to the job queue");
    describe_counter!(JOBS_COMPLETED, "Scrape jobs finished successfully");
    describe_counter!(JOBS_FAILED, "Scrape jobs that failed transiently");
    describe_counter!(JOBS_BLOCKED, "Scrape jobs permanently blocked by their source");
    describe_counter!(JOBS_REAPED, "Stale running jobs reaped by the sweeper");
    describe_counter!(PHOTOS_ACCEPTED, "Scraped photos stored after plausibility filtering");
    describe_counter!(PHOTOS_FILTERED, "Scraped photos rejected by plausibility filtering");
    describe_counter!(MATCHES_CREATED, "Flight-photo match candidates created");
    describe_histogram!(JOB_DURATION, "Duration of scrape job runs in seconds");
}
