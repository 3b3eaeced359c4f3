// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::usecases::queue_admin::{QueueAdmin, QueueStats, RequeueReport, ResetReport};
use crate::domain::services::queue_control::{QueueSettings, SettingsUpdate};
use crate::presentation::errors::AppError;
use axum::{extract::Path, Extension, Json};
use std::sync::Arc;

/// 队列统计
pub async fn get_stats(
    Extension(admin): Extension<Arc<QueueAdmin>>,
) -> Result<Json<QueueStats>, AppError> {
    Ok(Json(admin.stats().await?))
}

/// 暂停队列，返回最新统计
pub async fn pause(
    Extension(admin): Extension<Arc<QueueAdmin>>,
) -> Result<Json<QueueStats>, AppError> {
    admin.pause().await?;
    Ok(Json(admin.stats().await?))
}

/// 恢复队列并立即补位，返回最新统计
pub async fn resume(
    Extension(admin): Extension<Arc<QueueAdmin>>,
) -> Result<Json<QueueStats>, AppError> {
    admin.resume().await?;
    Ok(Json(admin.stats().await?))
}

/// 更新控制项
///
/// 超出范围的值按规则限制，不会被拒绝
pub async fn update_settings(
    Extension(admin): Extension<Arc<QueueAdmin>>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<QueueSettings>, AppError> {
    Ok(Json(admin.update_settings(update).await?))
}

pub async fn reprocess(
    Extension(admin): Extension<Arc<QueueAdmin>>,
) -> Result<Json<RequeueReport>, AppError> {
    Ok(Json(admin.reprocess().await?))
}

pub async fn retry_failed(
    Extension(admin): Extension<Arc<QueueAdmin>>,
) -> Result<Json<RequeueReport>, AppError> {
    Ok(Json(admin.retry_failed().await?))
}

/// 立即重扫一个注册号
pub async fn rescan_registration(
    Extension(admin): Extension<Arc<QueueAdmin>>,
    Path(registration): Path<String>,
) -> Result<Json<RequeueReport>, AppError> {
    Ok(Json(admin.rescan_registration(&registration).await?))
}

/// 清空全部数据
pub async fn full_reset(
    Extension(admin): Extension<Arc<QueueAdmin>>,
) -> Result<Json<ResetReport>, AppError> {
    Ok(Json(admin.full_reset().await?))
}
