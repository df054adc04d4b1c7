use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::external::{FetchError, TransportError};

/// 统一的API错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 拉取流程错误
    Fetch(FetchError),
    /// 已有加载在进行
    Conflict(String),
    /// 内部服务器错误
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Fetch(e) => write!(f, "Fetch error: {}", e),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::Fetch(err)
    }
}

/// 从anyhow::Error转换
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

fn fetch_status(err: &FetchError) -> StatusCode {
    match err {
        FetchError::NoCredential => StatusCode::SERVICE_UNAVAILABLE,
        FetchError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
        FetchError::Transport(TransportError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        FetchError::Transport(_)
        | FetchError::InvalidCredential(_)
        | FetchError::MalformedRequest(_)
        | FetchError::Api { .. }
        | FetchError::Decode(_) => StatusCode::BAD_GATEWAY,
        FetchError::EmptyResult => StatusCode::SERVICE_UNAVAILABLE,
        FetchError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 实现IntoResponse，将错误转换为HTTP响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Fetch(ref e) => {
                tracing::error!("Fetch error: {}", e);
                (fetch_status(e), e.kind(), e.user_message())
            }
            ApiError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;
