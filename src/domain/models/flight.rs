// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 航班记录
///
/// 由导入流程（CSV/JSON 解析器或同步任务）产生，是照片匹配的参照数据。
/// 出发日期必填，到达日期、机场代码和注册号均可能缺失。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flight {
    pub id: Uuid,
    /// 所属导入批次
    pub import_batch_id: Uuid,
    /// 出发日期
    pub date: NaiveDate,
    /// 到达日期（跨日航班）
    pub arrival_date: Option<NaiveDate>,
    pub flight_number: Option<String>,
    pub departure_airport_iata: Option<String>,
    pub departure_airport_icao: Option<String>,
    pub arrival_airport_iata: Option<String>,
    pub arrival_airport_icao: Option<String>,
    pub airline: Option<String>,
    pub aircraft: Option<String>,
    /// 飞机注册号
    pub registration: Option<String>,
}

impl Flight {
    /// 创建只包含日期的航班记录，其余字段由调用方填充
    pub fn new(import_batch_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            import_batch_id,
            date,
            arrival_date: None,
            flight_number: None,
            departure_airport_iata: None,
            departure_airport_icao: None,
            arrival_airport_iata: None,
            arrival_airport_icao: None,
            airline: None,
            aircraft: None,
            registration: None,
        }
    }

    /// 出发和到达两端的全部机场代码（IATA 与 ICAO），统一为大写
    pub fn airport_codes(&self) -> impl Iterator<Item = String> + '_ {
        [
            &self.departure_airport_iata,
            &self.arrival_airport_iata,
            &self.departure_airport_icao,
            &self.arrival_airport_icao,
        ]
        .into_iter()
        .flatten()
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
    }

    /// 出发日期以及（若存在）到达日期
    pub fn service_dates(&self) -> impl Iterator<Item = NaiveDate> {
        std::iter::once(self.date).chain(self.arrival_date)
    }
}
