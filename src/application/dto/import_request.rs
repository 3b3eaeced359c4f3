// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flight::Flight;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 航班导入请求DTO
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ImportRequestDto {
    /// 导入批次ID，缺省时自动生成
    pub batch_id: Option<Uuid>,

    #[validate(length(min = 1, max = 10000), nested)]
    pub flights: Vec<FlightDto>,
}

/// 单条航班记录
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct FlightDto {
    pub date: NaiveDate,
    pub arrival_date: Option<NaiveDate>,
    #[validate(length(max = 16))]
    pub flight_number: Option<String>,
    #[validate(length(min = 3, max = 3))]
    pub departure_airport_iata: Option<String>,
    #[validate(length(min = 4, max = 4))]
    pub departure_airport_icao: Option<String>,
    #[validate(length(min = 3, max = 3))]
    pub arrival_airport_iata: Option<String>,
    #[validate(length(min = 4, max = 4))]
    pub arrival_airport_icao: Option<String>,
    pub airline: Option<String>,
    pub aircraft: Option<String>,
    #[validate(length(min = 1, max = 16))]
    pub registration: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FlightDto {
    /// 转换为领域模型，空白字段视为缺失
    pub fn into_flight(self, import_batch_id: Uuid) -> Flight {
        let mut flight = Flight::new(import_batch_id, self.date);
        flight.arrival_date = self.arrival_date;
        flight.flight_number = clean(self.flight_number);
        flight.departure_airport_iata = clean(self.departure_airport_iata);
        flight.departure_airport_icao = clean(self.departure_airport_icao);
        flight.arrival_airport_iata = clean(self.arrival_airport_iata);
        flight.arrival_airport_icao = clean(self.arrival_airport_icao);
        flight.airline = clean(self.airline);
        flight.aircraft = clean(self.aircraft);
        flight.registration = clean(self.registration);
        flight
    }
}
