// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use std::collections::BTreeSet;
use std::time::Duration;
use tailspotter::engines::http_scraper::HttpPhotoScraper;
use tailspotter::engines::traits::{PhotoScraper, ScraperError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scraper(server: &MockServer) -> HttpPhotoScraper {
    HttpPhotoScraper::new(
        "jetphotos",
        &format!("{}/scrape/jetphotos", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn parses_photos_and_stamps_source() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape/jetphotos"))
        .and(body_json(json!({
            "registration": "N506DN",
            "airport_codes": ["JFK", "KJFK"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "source": "something-else",
                "source_photo_id": "11",
                "source_url": "https://photos.example/11",
                "registration": "N506DN",
                "airport_code": "JFK",
                "photo_date": "2024-03-01"
            },
            {
                "source_photo_id": "12",
                "source_url": "https://photos.example/12",
                "registration": "N506DN"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let hints: BTreeSet<String> = ["JFK", "KJFK"].iter().map(|s| s.to_string()).collect();
    let photos = scraper(&server).scrape("N506DN", Some(&hints)).await.unwrap();

    assert_eq!(photos.len(), 2);
    assert!(photos.iter().all(|p| p.source == "jetphotos"));
    assert_eq!(photos[0].airport_code.as_deref(), Some("JFK"));
    assert_eq!(photos[1].photo_date, None);
}

#[tokio::test]
async fn forbidden_is_a_permanent_block() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Cloudflare challenge"))
        .mount(&server)
        .await;

    let err = scraper(&server).scrape("N506DN", None).await.unwrap_err();
    assert!(err.is_permanent());
    assert!(matches!(err, ScraperError::PermanentBlock(ref msg) if msg.contains("Cloudflare")));
}

#[tokio::test]
async fn server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = scraper(&server).scrape("N506DN", None).await.unwrap_err();
    assert!(!err.is_permanent());
    assert_eq!(err.to_string(), "Scrape failed: jetphotos returned HTTP 500");
}

#[tokio::test]
async fn malformed_body_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = scraper(&server).scrape("N506DN", None).await.unwrap_err();
    assert!(!err.is_permanent());
}
