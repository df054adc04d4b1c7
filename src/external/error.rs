// 外部 API 错误类型定义
//
// FetchError 是拉取流程的错误分类：
// - 可恢复错误（网络、空结果、一般 API 失败）触发回退查询
// - 配额、密钥、请求格式错误立即返回给调用方

use thiserror::Error;

use crate::services::cache::StorageError;

/// 网络层错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// 拉取流程的统一错误类型
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("YouTube API key is not configured")]
    NoCredential,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("invalid API credential: {0}")]
    InvalidCredential(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no usable videos in response")]
    EmptyResult,

    #[error("invalid API response: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FetchError {
    /// 是否应继续尝试下一级回退查询
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_)
                | FetchError::Api { .. }
                | FetchError::EmptyResult
                | FetchError::Decode(_)
        )
    }

    /// 稳定的错误类型标识
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NoCredential => "no_credential",
            FetchError::Transport(_) => "transport_error",
            FetchError::QuotaExceeded(_) => "quota_exceeded",
            FetchError::InvalidCredential(_) => "invalid_credential",
            FetchError::MalformedRequest(_) => "malformed_request",
            FetchError::Api { .. } => "api_error",
            FetchError::EmptyResult => "empty_result",
            FetchError::Decode(_) => "decode_error",
            FetchError::Storage(_) => "storage_error",
        }
    }

    /// 面向用户的提示文本
    pub fn user_message(&self) -> String {
        match self {
            FetchError::NoCredential => {
                "No YouTube API key is configured. Set YOUTUBE_API_KEY to load live videos."
            }
            FetchError::Transport(TransportError::Timeout) => {
                "YouTube did not respond in time. Check your network connection and try again."
            }
            FetchError::Transport(_) => {
                "Could not reach YouTube. Check your network connection and try again."
            }
            FetchError::QuotaExceeded(_) => {
                "The YouTube API quota has been used up. Try again tomorrow or configure another API key."
            }
            FetchError::InvalidCredential(_) => {
                "The YouTube API key was rejected. Check YOUTUBE_API_KEY and make sure the YouTube Data API v3 is enabled for it."
            }
            FetchError::MalformedRequest(_) => {
                "YouTube rejected the request as invalid. Check the query settings (region code, parts, order)."
            }
            FetchError::Api { .. } => "YouTube returned an error. Please try again in a moment.",
            FetchError::EmptyResult => {
                "No popular shorts were found right now. Please try again later."
            }
            FetchError::Decode(_) => {
                "YouTube returned an unexpected response. Please try again later."
            }
            FetchError::Storage(_) => {
                "The local cache is unavailable. Videos will be fetched again on the next load."
            }
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(FetchError::Transport(TransportError::Timeout).is_recoverable());
        assert!(FetchError::EmptyResult.is_recoverable());
        assert!(FetchError::Api { status: 500, message: "boom".into() }.is_recoverable());
        assert!(!FetchError::QuotaExceeded("quota".into()).is_recoverable());
        assert!(!FetchError::InvalidCredential("bad".into()).is_recoverable());
        assert!(!FetchError::MalformedRequest("bad".into()).is_recoverable());
    }

    #[test]
    fn test_user_message_is_guidance_not_raw_error() {
        let err = FetchError::QuotaExceeded("The request cannot be completed because you have exceeded your quota.".into());
        assert_eq!(err.kind(), "quota_exceeded");
        assert!(err.user_message().contains("quota"));
        assert!(!err.user_message().contains("cannot be completed"));
    }
}
