// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::photo::{CandidatePhoto, FlightPhotoMatch};
use crate::domain::repositories::scrape_job_repository::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 照片与匹配仓库特质
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// 检查 (来源, 来源照片ID) 是否已存在
    async fn photo_exists(&self, source: &str, source_photo_id: &str)
        -> Result<bool, RepositoryError>;
    /// 插入候选照片
    async fn create_photo(&self, photo: &CandidatePhoto) -> Result<(), RepositoryError>;
    /// 查找注册号下的全部候选照片
    async fn find_photos_by_registration(
        &self,
        registration: &str,
    ) -> Result<Vec<CandidatePhoto>, RepositoryError>;
    /// 检查 (航班, 照片) 是否已有匹配
    async fn match_exists(&self, flight_id: Uuid, photo_id: Uuid) -> Result<bool, RepositoryError>;
    /// 插入匹配
    async fn create_match(&self, photo_match: &FlightPhotoMatch) -> Result<(), RepositoryError>;
    /// 查找照片的全部匹配
    async fn find_matches_by_photo(&self, photo_id: Uuid)
        -> Result<Vec<FlightPhotoMatch>, RepositoryError>;
    /// 删除所有匹配
    async fn delete_all_matches(&self) -> Result<u64, RepositoryError>;
    /// 删除所有候选照片
    async fn delete_all_photos(&self) -> Result<u64, RepositoryError>;
}
