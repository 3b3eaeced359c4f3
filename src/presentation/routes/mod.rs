// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::usecases::import_flights::FlightImporter;
use crate::application::usecases::queue_admin::QueueAdmin;
use crate::presentation::handlers::{import_handler, queue_handler};
use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建管理接口路由
///
/// # 返回值
///
/// 返回未绑定依赖的路由，依赖通过 `Extension` 层注入
pub fn routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route("/v1/queue", get(queue_handler::get_stats))
        .route("/v1/queue/pause", post(queue_handler::pause))
        .route("/v1/queue/resume", post(queue_handler::resume))
        .route("/v1/queue/settings", put(queue_handler::update_settings))
        .route("/v1/queue/reprocess", post(queue_handler::reprocess))
        .route("/v1/queue/retry-failed", post(queue_handler::retry_failed))
        .route(
            "/v1/registrations/{registration}/rescan",
            post(queue_handler::rescan_registration),
        )
        .route("/v1/reset", post(queue_handler::full_reset))
        .route("/v1/imports", post(import_handler::import_flights))
}

/// 绑定依赖后的完整应用
pub fn app(admin: Arc<QueueAdmin>, importer: Arc<FlightImporter>) -> Router {
    routes()
        .layer(Extension(admin))
        .layer(Extension(importer))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
