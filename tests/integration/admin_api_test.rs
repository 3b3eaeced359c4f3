// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestApp;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use tailspotter::presentation::routes;

async fn server() -> (TestApp, TestServer) {
    let app = TestApp::new().await;
    let router = routes::app(app.admin(), app.importer(&["jetphotos", "planespotters"]));
    let server = TestServer::new(router).unwrap();
    (app, server)
}

/// 健康检查测试
#[tokio::test]
async fn health_check_works() {
    let (_app, server) = server().await;

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn import_creates_jobs_and_reports_stats() {
    let (_app, server) = server().await;

    let response = server
        .post("/v1/imports")
        .json(&json!({
            "flights": [
                {
                    "date": "2024-03-01",
                    "flight_number": "DL1",
                    "departure_airport_iata": "JFK",
                    "arrival_airport_iata": "LHR",
                    "registration": "N506DN"
                },
                {
                    "date": "2024-03-02",
                    "flight_number": "DL2",
                    "departure_airport_iata": "LHR",
                    "arrival_airport_iata": "JFK",
                    "registration": " "
                }
            ]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let summary: Value = response.json();
    assert_eq!(summary["flights_imported"], 2);
    assert_eq!(summary["registrations"], 1);
    assert_eq!(summary["jobs_created"], 2);

    let stats: Value = server.get("/v1/queue").await.json();
    assert_eq!(stats["pending"], 2);
    assert_eq!(stats["running"], 0);
    assert_eq!(stats["settings"]["max_jobs"], 3);
    assert_eq!(stats["settings"]["paused"], false);
}

#[tokio::test]
async fn import_rejects_invalid_airport_codes() {
    let (_app, server) = server().await;

    let response = server
        .post("/v1/imports")
        .json(&json!({
            "flights": [
                { "date": "2024-03-01", "departure_airport_iata": "JFKX" }
            ]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.post("/v1/imports").json(&json!({ "flights": [] })).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pause_resume_and_settings_round_trip() {
    let (app, server) = server().await;

    let stats: Value = server.post("/v1/queue/pause").await.json();
    assert_eq!(stats["settings"]["paused"], true);
    assert!(app.control.is_paused().await.unwrap());

    let settings: Value = server
        .put("/v1/queue/settings")
        .json(&json!({ "max_jobs": 99, "job_delay_seconds": 10, "rescan_interval_hours": 0 }))
        .await
        .json();
    assert_eq!(settings["max_jobs"], 10);
    assert_eq!(settings["job_delay_seconds"], 10);
    assert_eq!(settings["rescan_interval_hours"], 0);

    let stats: Value = server.post("/v1/queue/resume").await.json();
    assert_eq!(stats["settings"]["paused"], false);
}

#[tokio::test]
async fn rescan_of_unknown_registration_is_not_found() {
    let (_app, server) = server().await;

    let response = server.post("/v1/registrations/N000XX/rescan").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn reprocess_retry_and_reset_on_empty_queue() {
    let (_app, server) = server().await;

    let report: Value = server.post("/v1/queue/reprocess").await.json();
    assert_eq!(report, json!({ "reset": 0, "submitted": 0 }));

    let report: Value = server.post("/v1/queue/retry-failed").await.json();
    assert_eq!(report, json!({ "reset": 0, "submitted": 0 }));

    let report: Value = server.post("/v1/reset").await.json();
    assert_eq!(
        report,
        json!({ "matches": 0, "photos": 0, "jobs": 0, "flights": 0 })
    );
}
