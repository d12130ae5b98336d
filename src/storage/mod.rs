use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::{PresignMethod, S3Options};
use crate::error::Result;

/// Streaming response/upload body / 字节流
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Raw HEAD result, every field may be omitted by the store / 元数据原始结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRecord {
    pub content_length: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Raw listing result / 列表原始结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectListing {
    /// Object keys in store order / 对象键
    pub keys: Vec<String>,
    /// Common prefixes (only with a delimiter) / 公共前缀
    pub common_prefixes: Vec<String>,
}

/// Object gateway interface (signed object operations only) / 对象网关接口
///
/// One gateway is bound to one bucket with one set of credentials.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Gateway name / 网关名称
    fn name(&self) -> &str;

    /// Bound bucket / 绑定的存储桶
    fn bucket(&self) -> &str;

    /// Upload complete object / 上传对象
    async fn put(&self, key: &str, body: Bytes, content_type: &str, acl: Option<&str>) -> Result<()>;

    /// Download complete object / 下载对象
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Object metadata / 获取元数据
    async fn head(&self, key: &str) -> Result<HeadRecord>;

    /// Delete object / 删除对象
    async fn delete(&self, key: &str) -> Result<()>;

    /// List objects under prefix; with a delimiter, fold deeper keys into common prefixes
    /// 列出对象（有分隔符时只列一层）
    async fn list_objects(&self, prefix: &str, delimiter: Option<char>) -> Result<ObjectListing>;

    /// Sign a URL for one operation on one key / 生成预签名URL
    async fn presign(&self, key: &str, method: PresignMethod, expires_in: u32) -> Result<String>;

    /// Buckets visible to these credentials / 列出存储桶
    async fn list_buckets(&self) -> Result<Vec<String>>;
}

/// Builds a gateway from resolved options / 网关构造器
///
/// Callers validate credentials before calling `connect`.
pub trait Connector: Send + Sync {
    fn connect(&self, options: &S3Options) -> Result<Arc<dyn ObjectGateway>>;
}

pub mod memory;

pub use memory::{MemoryConnector, MemoryFetcher, MemoryGateway, MemoryStore};
