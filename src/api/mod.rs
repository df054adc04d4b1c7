pub mod error;
pub mod health;
pub mod response;
pub mod shorts;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::services::FetchOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FetchOrchestrator>,
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Shorts Ranking Backend API v0.1" }))
        .route("/api/health", get(health::health_check))
        .route("/api/shorts", get(shorts::get_shorts))
        .route("/api/shorts/refresh", post(shorts::refresh_shorts))
        .route("/api/shorts/retry", post(shorts::retry_shorts))
        .route("/api/cache/clear", post(shorts::clear_cache))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}
