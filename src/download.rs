//! Presigned URL transport / 预签名URL下载
//!
//! Fetches a presigned URL and hands the body back as a stream, so large
//! objects are never loaded into memory unless the caller asks for it.
//! 流式传输：响应体转换为字节流，不加载到内存。

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;

use crate::error::{Result, S3Error};
use crate::storage::ByteStream;

/// Fetched response / 下载响应
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// None when the transport produced no body / 无响应体时为None
    pub body: Option<ByteStream>,
}

impl FetchResponse {
    pub fn new(status: u16, content_type: Option<String>, body: Option<ByteStream>) -> Self {
        Self { status, content_type, body }
    }

    /// Collect the whole body / 读取完整响应体
    pub async fn bytes(self) -> Result<Bytes> {
        let Some(mut stream) = self.body else {
            return Ok(Bytes::new());
        };
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| S3Error::Fetch(e.to_string()))?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Body decoded as UTF-8, invalid sequences replaced / 文本（非法UTF-8替换）
    pub async fn text(self) -> Result<String> {
        let data = self.bytes().await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

/// HTTP transport interface / 传输接口
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET the URL; non-success statuses are errors / GET请求
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

/// reqwest based transport / 基于reqwest的传输
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| S3Error::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Presigned fetch failed: HTTP {}", status);
            return Err(S3Error::Fetch(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

        Ok(FetchResponse::new(status.as_u16(), content_type, Some(Box::pin(stream))))
    }
}
