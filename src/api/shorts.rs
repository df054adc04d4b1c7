use axum::{extract::State, response::IntoResponse};

use super::error::{ApiError, ApiResult};
use super::response::{success, success_message};
use super::AppState;
use crate::external::FetchError;
use crate::models::Feed;

fn into_feed(result: Result<Option<Feed>, FetchError>) -> ApiResult<Feed> {
    match result? {
        Some(feed) => Ok(feed),
        None => Err(ApiError::Conflict(
            "Videos are already being loaded. Please wait for the current load to finish."
                .to_string(),
        )),
    }
}

/// 加载短视频列表（优先使用缓存）
pub async fn get_shorts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let feed = into_feed(state.orchestrator.load().await)?;
    Ok(success(feed))
}

/// 强制刷新
pub async fn refresh_shorts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let feed = into_feed(state.orchestrator.refresh().await)?;
    Ok(success(feed))
}

/// 失败后重试
pub async fn retry_shorts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let feed = into_feed(state.orchestrator.retry().await)?;
    Ok(success(feed))
}

/// 清空缓存
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.orchestrator.clear_cache().await;
    Ok(success_message("Cache cleared"))
}
