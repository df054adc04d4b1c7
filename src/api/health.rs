use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use super::error::ApiResult;
use super::response::success;
use super::AppState;

/// 健康检查端点
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let orchestrator = &state.orchestrator;
    let config = orchestrator.config();
    let quota = orchestrator.quota_usage().await;

    let youtube_status = if config.has_credential() {
        "configured"
    } else {
        "not_configured"
    };

    Ok(success(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "youtube_api": youtube_status,
        "mode": config.query.mode.as_str(),
        "region": config.query.region_code,
        "loading": orchestrator.is_loading(),
        "quota": quota,
    })))
}
