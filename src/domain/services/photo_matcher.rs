// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flight::Flight;
use crate::domain::models::photo::{CandidatePhoto, DateReason, FlightPhotoMatch, MatchReasons};
use crate::domain::repositories::flight_repository::FlightRepository;
use crate::domain::repositories::photo_repository::PhotoRepository;
use crate::domain::repositories::scrape_job_repository::RepositoryError;
use std::sync::Arc;
use tracing::debug;

/// 注册号一致的基础分
pub const REGISTRATION_POINTS: i32 = 30;
/// 机场一致的分数
pub const AIRPORT_POINTS: i32 = 30;

/// 计算一对航班与照片的匹配分数和理由
///
/// 注册号一致是前提，固定 +30。照片日期等于出发或到达日期 +40（exact），
/// 相差一天 +20（adjacent）。照片机场与任一端 IATA/ICAO 代码一致 +30。
pub fn score_pair(flight: &Flight, photo: &CandidatePhoto) -> (i32, MatchReasons) {
    let mut reasons = MatchReasons {
        registration: true,
        date: None,
        airport: None,
    };
    let mut score = REGISTRATION_POINTS;

    if let Some(photo_date) = photo.photo_date {
        let exact = flight.service_dates().any(|date| date == photo_date);
        let adjacent = flight
            .service_dates()
            .any(|date| (photo_date - date).num_days().abs() <= 1);
        reasons.date = if exact {
            Some(DateReason::Exact)
        } else if adjacent {
            Some(DateReason::Adjacent)
        } else {
            None
        };
        score += reasons.date.map_or(0, DateReason::points);
    }

    if let Some(code) = photo.airport_code.as_deref() {
        let code = code.trim().to_uppercase();
        if !code.is_empty() && flight.airport_codes().any(|candidate| candidate == code) {
            score += AIRPORT_POINTS;
            reasons.airport = Some(code);
        }
    }

    (score, reasons)
}

/// 照片匹配引擎
///
/// 为同一注册号下的航班和候选照片生成匹配。只有同时具备日期理由和
/// 机场理由的组合才会被保存，已有匹配的组合会被跳过。
pub struct PhotoMatcher {
    flights: Arc<dyn FlightRepository>,
    photos: Arc<dyn PhotoRepository>,
}

impl PhotoMatcher {
    pub fn new(flights: Arc<dyn FlightRepository>, photos: Arc<dyn PhotoRepository>) -> Self {
        Self { flights, photos }
    }

    /// 为注册号计算并保存新的匹配
    ///
    /// # 返回值
    ///
    /// 返回本次新建的匹配
    pub async fn match_registration(
        &self,
        registration: &str,
    ) -> Result<Vec<FlightPhotoMatch>, RepositoryError> {
        let flights = self.flights.find_by_registration(registration).await?;
        let photos = self.photos.find_photos_by_registration(registration).await?;

        let mut created = Vec::new();
        for photo in &photos {
            for flight in &flights {
                let (score, reasons) = score_pair(flight, photo);
                if reasons.date.is_none() || reasons.airport.is_none() {
                    continue;
                }
                if self.photos.match_exists(flight.id, photo.id).await? {
                    continue;
                }

                let photo_match = FlightPhotoMatch::new(flight.id, photo.id, score, reasons);
                self.photos.create_match(&photo_match).await?;
                created.push(photo_match);
            }
        }

        debug!(
            "Matched {} new pairs for {} ({} flights, {} photos)",
            created.len(),
            registration,
            flights.len(),
            photos.len()
        );
        Ok(created)
    }
}
