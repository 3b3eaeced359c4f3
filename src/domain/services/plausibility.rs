// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flight::Flight;
use crate::domain::models::photo::ScrapedPhoto;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// 合理性过滤器
///
/// 由注册号下已知航班推导出的日期与机场窗口：
/// 出发或到达日期前后一天内的所有日期，以及出现过的全部 IATA/ICAO 机场代码。
/// 只有日期和机场同时落在窗口内的照片才会被接受。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlausibilityFilter {
    dates: BTreeSet<NaiveDate>,
    airports: BTreeSet<String>,
}

impl PlausibilityFilter {
    /// 从航班列表构建过滤器
    pub fn from_flights<'a>(flights: impl IntoIterator<Item = &'a Flight>) -> Self {
        let mut filter = Self::default();
        for flight in flights {
            for date in flight.service_dates() {
                for offset in -1..=1 {
                    filter.dates.insert(date + Duration::days(offset));
                }
            }
            filter.airports.extend(flight.airport_codes());
        }
        filter
    }

    /// 机场代码集合，作为抓取器的过滤提示
    pub fn airports(&self) -> &BTreeSet<String> {
        &self.airports
    }

    pub fn dates(&self) -> &BTreeSet<NaiveDate> {
        &self.dates
    }

    /// 照片的日期和机场是否都在窗口内
    pub fn accepts(&self, photo: &ScrapedPhoto) -> bool {
        let date_ok = photo
            .photo_date
            .is_some_and(|date| self.dates.contains(&date));
        let airport_ok = photo
            .airport_code
            .as_deref()
            .is_some_and(|code| self.airports.contains(&code.trim().to_uppercase()));
        date_ok && airport_ok
    }
}
