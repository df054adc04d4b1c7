// HTTP 传输层抽象
//
// 拉取流程只依赖 HttpClient trait，生产环境使用 reqwest 实现，
// 测试中可替换为脚本化的假客户端

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::error::TransportError;
use super::query::{HttpMethod, RequestDescriptor};

/// 原始 HTTP 响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP 客户端能力
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// 发送请求并读取完整响应体
    ///
    /// 非 2xx 状态不是传输错误，由调用方根据状态码分类
    async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, TransportError>;
}

/// 基于 reqwest 的客户端
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shorts-ranking-backend/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, TransportError> {
        debug!("HTTP {:?} {}", request.method, request.redacted_url());

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
        };
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("HTTP {} ({} bytes)", status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "{}").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(403, "").is_success());
    }

    #[test]
    fn test_client_builds() {
        assert!(ReqwestHttpClient::new(Duration::from_secs(10)).is_ok());
    }
}
