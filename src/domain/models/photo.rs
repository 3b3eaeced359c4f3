// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 抓取器返回的原始照片记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedPhoto {
    #[serde(default)]
    pub source: String,
    pub source_photo_id: String,
    pub source_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub full_image_url: Option<String>,
    pub registration: String,
    #[serde(default)]
    pub airport_code: Option<String>,
    #[serde(default)]
    pub photo_date: Option<NaiveDate>,
    #[serde(default)]
    pub photographer: Option<String>,
}

/// 候选照片
///
/// 通过合理性过滤后持久化的照片，以 (source, source_photo_id) 唯一标识。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidatePhoto {
    pub id: Uuid,
    pub source: String,
    pub source_photo_id: String,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
    pub full_image_url: Option<String>,
    pub registration: String,
    pub airport_code: Option<String>,
    pub photo_date: Option<NaiveDate>,
    pub photographer: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<ScrapedPhoto> for CandidatePhoto {
    fn from(photo: ScrapedPhoto) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: photo.source,
            source_photo_id: photo.source_photo_id,
            source_url: photo.source_url,
            thumbnail_url: photo.thumbnail_url,
            full_image_url: photo.full_image_url,
            registration: photo.registration,
            airport_code: photo.airport_code,
            photo_date: photo.photo_date,
            photographer: photo.photographer,
            created_at: Utc::now().into(),
        }
    }
}

/// 日期匹配类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateReason {
    /// 照片日期与出发或到达日期相同
    Exact,
    /// 照片日期与出发或到达日期相差一天
    Adjacent,
}

impl DateReason {
    pub fn points(self) -> i32 {
        match self {
            DateReason::Exact => 40,
            DateReason::Adjacent => 20,
        }
    }
}

impl fmt::Display for DateReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateReason::Exact => write!(f, "exact"),
            DateReason::Adjacent => write!(f, "adjacent"),
        }
    }
}

/// 匹配理由
///
/// 序列化为 `{"registration": true, "date": "exact", "airport": "JFK"}`，
/// 缺失的日期或机场理由不出现在结果中。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReasons {
    pub registration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airport: Option<String>,
}

/// 航班与照片的候选匹配
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightPhotoMatch {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub photo_id: Uuid,
    pub match_score: i32,
    pub match_reasons: MatchReasons,
    pub created_at: DateTime<FixedOffset>,
}

impl FlightPhotoMatch {
    pub fn new(flight_id: Uuid, photo_id: Uuid, match_score: i32, match_reasons: MatchReasons) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_id,
            photo_id,
            match_score,
            match_reasons,
            created_at: Utc::now().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reasons_serialize_without_missing_keys() {
        let reasons = MatchReasons {
            registration: true,
            date: Some(DateReason::Exact),
            airport: Some("JFK".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&reasons).unwrap(),
            json!({"registration": true, "date": "exact", "airport": "JFK"})
        );

        let partial = MatchReasons {
            registration: true,
            date: None,
            airport: None,
        };
        assert_eq!(serde_json::to_value(&partial).unwrap(), json!({"registration": true}));
    }

    #[test]
    fn test_scraped_photo_accepts_sparse_payload() {
        let photo: ScrapedPhoto = serde_json::from_value(json!({
            "source": "jetphotos",
            "source_photo_id": "1234",
            "source_url": "https://example.test/photo/1234",
            "registration": "N506DN",
            "photo_date": "2024-03-01"
        }))
        .unwrap();

        assert_eq!(photo.airport_code, None);
        assert_eq!(photo.photo_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }
}
