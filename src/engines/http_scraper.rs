// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::photo::ScrapedPhoto;
use crate::engines::traits::{PhotoScraper, ScraperError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// 抓取服务请求体
#[derive(Debug, Serialize)]
struct ScrapeServiceRequest<'a> {
    registration: &'a str,
    airport_codes: Option<Vec<&'a str>>,
}

/// HTTP 照片抓取器
///
/// 把站点相关的抓取委托给进程外的抓取服务：向 `endpoint` POST
/// `{ registration, airport_codes }`，服务返回照片记录的 JSON 数组。
/// 403/451 视为来源永久封锁。
pub struct HttpPhotoScraper {
    source: String,
    endpoint: url::Url,
    client: reqwest::Client,
}

impl HttpPhotoScraper {
    /// 创建 HTTP 抓取器
    ///
    /// # 参数
    ///
    /// * `source` - 来源标识
    /// * `endpoint` - 抓取服务地址
    /// * `timeout` - 单次请求超时
    pub fn new(
        source: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, ScraperError> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| ScraperError::Failed(format!("Invalid endpoint {}: {}", endpoint, e)))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("tailspotter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            source: source.into(),
            endpoint,
            client,
        })
    }
}

#[async_trait]
impl PhotoScraper for HttpPhotoScraper {
    fn source(&self) -> &str {
        &self.source
    }

    async fn scrape(
        &self,
        registration: &str,
        airport_hints: Option<&BTreeSet<String>>,
    ) -> Result<Vec<ScrapedPhoto>, ScraperError> {
        let body = ScrapeServiceRequest {
            registration,
            airport_codes: airport_hints.map(|codes| codes.iter().map(String::as_str).collect()),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS {
            let detail = response.text().await.unwrap_or_default();
            let detail = detail.trim();
            return Err(ScraperError::PermanentBlock(if detail.is_empty() {
                format!("{} refused access (HTTP {})", self.source, status.as_u16())
            } else {
                format!("{}: {}", self.source, detail)
            }));
        }
        if !status.is_success() {
            return Err(ScraperError::Failed(format!(
                "{} returned HTTP {}",
                self.source,
                status.as_u16()
            )));
        }

        let mut photos: Vec<ScrapedPhoto> = response.json().await?;
        for photo in &mut photos {
            photo.source = self.source.clone();
        }

        debug!(
            "Scraped {} photos for {} from {} in {}ms",
            photos.len(),
            registration,
            self.source,
            start.elapsed().as_millis()
        );
        Ok(photos)
    }
}
