// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flight::Flight;
use crate::domain::repositories::scrape_job_repository::RepositoryError;
use async_trait::async_trait;

/// 航班仓库特质
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// 插入航班
    async fn create(&self, flight: &Flight) -> Result<(), RepositoryError>;
    /// 查找注册号下的全部航班
    async fn find_by_registration(&self, registration: &str) -> Result<Vec<Flight>, RepositoryError>;
    /// 检查是否已存在相同的航班
    ///
    /// 比较日期、航班号、注册号以及出发/到达机场（IATA 或 ICAO 任一相同即可），
    /// 只比较传入航班上存在的字段。
    async fn exists_duplicate(&self, flight: &Flight) -> Result<bool, RepositoryError>;
    /// 删除所有航班
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}
