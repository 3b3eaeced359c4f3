// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::import_request::ImportRequestDto;
use crate::application::usecases::import_flights::{FlightImporter, ImportSummary};
use crate::presentation::errors::AppError;
use axum::{http::StatusCode, Extension, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 导入一批航班并为新注册号建抓取作业
pub async fn import_flights(
    Extension(importer): Extension<Arc<FlightImporter>>,
    Json(payload): Json<ImportRequestDto>,
) -> Result<(StatusCode, Json<ImportSummary>), AppError> {
    payload.validate()?;

    let batch_id = payload.batch_id.unwrap_or_else(Uuid::new_v4);
    let flights = payload
        .flights
        .into_iter()
        .map(|flight| flight.into_flight(batch_id))
        .collect();

    let summary = importer.import(flights, batch_id).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}
