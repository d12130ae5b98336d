use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::storage::ByteStream;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Stats {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

/// One-level listing: objects vs. "folders" / 单层列表结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    /// Full keys without trailing delimiter / 文件键
    pub files: Vec<String>,
    /// Common prefixes ending with the delimiter / 目录前缀
    pub folders: Vec<String>,
}

/// Upload body / 上传数据
pub enum WriteData {
    Text(String),
    Bytes(Bytes),
    Stream(ByteStream),
}

impl WriteData {
    /// Normalize any variant into raw bytes / 统一转换为字节
    pub async fn into_bytes(self) -> std::io::Result<Bytes> {
        match self {
            WriteData::Text(text) => Ok(Bytes::from(text)),
            WriteData::Bytes(bytes) => Ok(bytes),
            WriteData::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl std::fmt::Debug for WriteData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteData::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            WriteData::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            WriteData::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<&str> for WriteData {
    fn from(value: &str) -> Self {
        WriteData::Text(value.to_string())
    }
}

impl From<String> for WriteData {
    fn from(value: String) -> Self {
        WriteData::Text(value)
    }
}

impl From<&[u8]> for WriteData {
    fn from(value: &[u8]) -> Self {
        WriteData::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Vec<u8>> for WriteData {
    fn from(value: Vec<u8>) -> Self {
        WriteData::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for WriteData {
    fn from(value: Bytes) -> Self {
        WriteData::Bytes(value)
    }
}

impl From<ByteStream> for WriteData {
    fn from(value: ByteStream) -> Self {
        WriteData::Stream(value)
    }
}
