// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::photo::{CandidatePhoto, FlightPhotoMatch, MatchReasons};
use crate::domain::repositories::photo_repository::PhotoRepository;
use crate::domain::repositories::scrape_job_repository::RepositoryError;
use crate::infrastructure::database::entities::{
    candidate_photo as photo_entity, flight_photo_match as match_entity,
};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 候选照片与匹配仓库实现
#[derive(Clone)]
pub struct PhotoRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PhotoRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<photo_entity::Model> for CandidatePhoto {
    fn from(model: photo_entity::Model) -> Self {
        Self {
            id: model.id,
            source: model.source,
            source_photo_id: model.source_photo_id,
            source_url: model.source_url,
            thumbnail_url: model.thumbnail_url,
            full_image_url: model.full_image_url,
            registration: model.registration,
            airport_code: model.airport_code,
            photo_date: model.photo_date,
            photographer: model.photographer,
            created_at: model.created_at,
        }
    }
}

impl From<&CandidatePhoto> for photo_entity::ActiveModel {
    fn from(photo: &CandidatePhoto) -> Self {
        Self {
            id: Set(photo.id),
            source: Set(photo.source.clone()),
            source_photo_id: Set(photo.source_photo_id.clone()),
            source_url: Set(photo.source_url.clone()),
            thumbnail_url: Set(photo.thumbnail_url.clone()),
            full_image_url: Set(photo.full_image_url.clone()),
            registration: Set(photo.registration.clone()),
            airport_code: Set(photo.airport_code.clone()),
            photo_date: Set(photo.photo_date),
            photographer: Set(photo.photographer.clone()),
            created_at: Set(photo.created_at),
        }
    }
}

impl TryFrom<match_entity::Model> for FlightPhotoMatch {
    type Error = RepositoryError;

    fn try_from(model: match_entity::Model) -> Result<Self, Self::Error> {
        let match_reasons: MatchReasons = serde_json::from_value(model.match_reasons)
            .map_err(|e| DbErr::Json(e.to_string()))?;
        Ok(Self {
            id: model.id,
            flight_id: model.flight_id,
            photo_id: model.photo_id,
            match_score: model.match_score,
            match_reasons,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl PhotoRepository for PhotoRepositoryImpl {
    async fn photo_exists(
        &self,
        source: &str,
        source_photo_id: &str,
    ) -> Result<bool, RepositoryError> {
        let count = photo_entity::Entity::find()
            .filter(photo_entity::Column::Source.eq(source))
            .filter(photo_entity::Column::SourcePhotoId.eq(source_photo_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn create_photo(&self, photo: &CandidatePhoto) -> Result<(), RepositoryError> {
        let model: photo_entity::ActiveModel = photo.into();
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_photos_by_registration(
        &self,
        registration: &str,
    ) -> Result<Vec<CandidatePhoto>, RepositoryError> {
        let models = photo_entity::Entity::find()
            .filter(photo_entity::Column::Registration.eq(registration))
            .order_by_asc(photo_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(CandidatePhoto::from).collect())
    }

    async fn match_exists(&self, flight_id: Uuid, photo_id: Uuid) -> Result<bool, RepositoryError> {
        let count = match_entity::Entity::find()
            .filter(match_entity::Column::FlightId.eq(flight_id))
            .filter(match_entity::Column::PhotoId.eq(photo_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn create_match(&self, photo_match: &FlightPhotoMatch) -> Result<(), RepositoryError> {
        let reasons = serde_json::to_value(&photo_match.match_reasons)
            .map_err(|e| DbErr::Json(e.to_string()))?;
        let model = match_entity::ActiveModel {
            id: Set(photo_match.id),
            flight_id: Set(photo_match.flight_id),
            photo_id: Set(photo_match.photo_id),
            match_score: Set(photo_match.match_score),
            match_reasons: Set(reasons),
            created_at: Set(photo_match.created_at),
        };
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_matches_by_photo(
        &self,
        photo_id: Uuid,
    ) -> Result<Vec<FlightPhotoMatch>, RepositoryError> {
        let models = match_entity::Entity::find()
            .filter(match_entity::Column::PhotoId.eq(photo_id))
            .all(self.db.as_ref())
            .await?;
        models.into_iter().map(FlightPhotoMatch::try_from).collect()
    }

    async fn delete_all_matches(&self) -> Result<u64, RepositoryError> {
        let result = match_entity::Entity::delete_many()
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_all_photos(&self) -> Result<u64, RepositoryError> {
        let result = photo_entity::Entity::delete_many()
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
