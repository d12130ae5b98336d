//! S3 client facade / S3客户端
//!
//! Owns the base configuration and dispenses `S3File` handles. Every network
//! operation goes through an `ObjectGateway`. The base gateway is built once
//! and never replaced; a per-call override gets its own gateway that lives
//! only for that call.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{PresignOptions, S3Options};
use crate::download::{Fetcher, HttpFetcher};
use crate::drivers::s3::S3Connector;
use crate::error::{Result, S3Error};
use crate::file::S3File;
use crate::models::{ListResult, S3Stats, WriteData};
use crate::storage::{Connector, ObjectGateway};
use crate::tree::{build_tree, TreeNode};
use crate::utils::{guess_content_type, is_placeholder, DELIMITER};

/// Fixed object storage API / 对象存储接口
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Handle for one key, no I/O / 获取文件句柄
    fn file(&self, key: &str) -> S3File<'_>;

    /// Upload data, returns bytes written / 上传，返回字节数
    async fn write(&self, key: &str, data: WriteData, overrides: Option<&S3Options>) -> Result<u64>;

    /// Presigned URL / 预签名URL
    async fn presign(&self, key: &str, options: &PresignOptions) -> Result<String>;

    /// Delete object / 删除对象
    async fn unlink(&self, key: &str, overrides: Option<&S3Options>) -> Result<()>;

    /// Content length, 0 when not reported / 对象大小
    async fn size(&self, key: &str, overrides: Option<&S3Options>) -> Result<u64>;

    /// False on any probe failure, network errors included / 是否存在（任何错误都返回false）
    async fn exists(&self, key: &str, overrides: Option<&S3Options>) -> bool;

    /// Object metadata / 元数据
    async fn stat(&self, key: &str, overrides: Option<&S3Options>) -> Result<S3Stats>;

    /// Same as `unlink` / 删除对象
    async fn delete(&self, key: &str, overrides: Option<&S3Options>) -> Result<()>;

    /// One level under prefix / 列出一层
    async fn list(&self, prefix: &str, overrides: Option<&S3Options>) -> Result<ListResult>;

    /// Every key under prefix, placeholders removed / 递归列出所有键
    async fn all(&self, prefix: &str, overrides: Option<&S3Options>) -> Result<Vec<String>>;

    /// Directory tree of every key under prefix / 目录树
    async fn tree(&self, prefix: &str, overrides: Option<&S3Options>) -> Result<Vec<TreeNode>>;

    /// Accessible buckets / 列出存储桶
    async fn list_buckets(&self, overrides: Option<&S3Options>) -> Result<Vec<String>>;
}

/// Derive a call-local gateway from base options and an override / 派生网关
///
/// Pure with respect to the client: nothing is cached or shared.
pub fn derive_gateway(
    connector: &dyn Connector,
    base: &S3Options,
    overrides: &S3Options,
) -> Result<Arc<dyn ObjectGateway>> {
    let merged = overrides.merged_over(base);
    if !merged.has_credentials() {
        return Err(S3Error::Configuration(
            "accessKeyId and secretAccessKey are required".to_string(),
        ));
    }
    connector.connect(&merged)
}

/// S3 client / S3客户端
pub struct S3Client {
    options: S3Options,
    gateway: Option<Arc<dyn ObjectGateway>>,
    connector: Arc<dyn Connector>,
    fetcher: Arc<dyn Fetcher>,
}

impl S3Client {
    /// Create client backed by rust-s3 and reqwest / 创建客户端
    ///
    /// Without credentials the client is still created, but every network
    /// operation fails with a configuration error unless an override supplies them.
    pub fn new(options: S3Options) -> Result<Self> {
        Self::with_backends(options, Arc::new(S3Connector), Arc::new(HttpFetcher::new()))
    }

    /// Create client from AWS_* environment variables / 从环境变量创建
    pub fn from_env() -> Result<Self> {
        Self::new(S3Options::from_env())
    }

    /// Create client with custom gateway connector and transport / 自定义后端
    pub fn with_backends(
        options: S3Options,
        connector: Arc<dyn Connector>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let gateway = if options.has_credentials() {
            Some(connector.connect(&options)?)
        } else {
            tracing::debug!("S3Client created without credentials");
            None
        };
        Ok(Self { options, gateway, connector, fetcher })
    }

    pub fn options(&self) -> &S3Options {
        &self.options
    }

    /// Handle bound to per-handle overrides / 带配置覆盖的文件句柄
    pub fn file_with(&self, key: &str, overrides: S3Options) -> S3File<'_> {
        S3File::new(key, self, Some(overrides))
    }

    /// Download object directly through the gateway / 直接下载对象
    pub async fn read(&self, key: &str, overrides: Option<&S3Options>) -> Result<Bytes> {
        self.gateway(overrides)?.get(key).await
    }

    pub(crate) fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    /// Options in effect for a call / 当前调用生效的配置
    pub(crate) fn effective_options(&self, overrides: Option<&S3Options>) -> S3Options {
        match overrides {
            Some(o) => o.merged_over(&self.options),
            None => self.options.clone(),
        }
    }

    fn gateway(&self, overrides: Option<&S3Options>) -> Result<Arc<dyn ObjectGateway>> {
        match overrides {
            Some(o) => derive_gateway(self.connector.as_ref(), &self.options, o),
            None => self.gateway.clone().ok_or_else(|| {
                S3Error::Configuration(
                    "S3Client not initialized: accessKeyId and secretAccessKey are required"
                        .to_string(),
                )
            }),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Client {
    fn file(&self, key: &str) -> S3File<'_> {
        S3File::new(key, self, None)
    }

    async fn write(&self, key: &str, data: WriteData, overrides: Option<&S3Options>) -> Result<u64> {
        let gateway = self.gateway(overrides)?;
        let body = data.into_bytes().await.map_err(|e| S3Error::upload(key, e))?;
        let len = body.len() as u64;

        let effective = self.effective_options(overrides);
        let content_type = effective
            .content_type
            .clone()
            .unwrap_or_else(|| guess_content_type(key));

        gateway.put(key, body, &content_type, effective.acl.as_deref()).await?;
        tracing::debug!(
            "{} write: bucket={}, key={}, bytes={}",
            gateway.name(),
            gateway.bucket(),
            key,
            len
        );
        Ok(len)
    }

    async fn presign(&self, key: &str, options: &PresignOptions) -> Result<String> {
        let gateway = self.gateway(options.overrides.as_ref())?;
        gateway.presign(key, options.method, options.expires_in).await
    }

    async fn unlink(&self, key: &str, overrides: Option<&S3Options>) -> Result<()> {
        self.gateway(overrides)?.delete(key).await
    }

    async fn size(&self, key: &str, overrides: Option<&S3Options>) -> Result<u64> {
        let head = self.gateway(overrides)?.head(key).await?;
        Ok(head.content_length.unwrap_or(0))
    }

    async fn exists(&self, key: &str, overrides: Option<&S3Options>) -> bool {
        match self.size(key, overrides).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("S3 exists probe failed, reporting absent: key={}, error={}", key, e);
                false
            }
        }
    }

    async fn stat(&self, key: &str, overrides: Option<&S3Options>) -> Result<S3Stats> {
        let head = self.gateway(overrides)?.head(key).await?;
        Ok(S3Stats {
            size: head.content_length.unwrap_or(0),
            last_modified: head.last_modified.unwrap_or_else(Utc::now),
            etag: head.etag.unwrap_or_default(),
            content_type: head.content_type.unwrap_or_default(),
        })
    }

    async fn delete(&self, key: &str, overrides: Option<&S3Options>) -> Result<()> {
        self.unlink(key, overrides).await
    }

    async fn list(&self, prefix: &str, overrides: Option<&S3Options>) -> Result<ListResult> {
        let listing = self.gateway(overrides)?.list_objects(prefix, Some(DELIMITER)).await?;

        let mut seen = HashSet::new();
        let files = listing
            .keys
            .into_iter()
            .filter(|k| !is_placeholder(k))
            .filter(|k| seen.insert(k.clone()))
            .collect();

        let mut seen = HashSet::new();
        let folders = listing
            .common_prefixes
            .into_iter()
            .filter(|p| is_placeholder(p))
            .filter(|p| seen.insert(p.clone()))
            .collect();

        Ok(ListResult { files, folders })
    }

    async fn all(&self, prefix: &str, overrides: Option<&S3Options>) -> Result<Vec<String>> {
        let listing = self.gateway(overrides)?.list_objects(prefix, None).await?;
        Ok(listing.keys.into_iter().filter(|k| !is_placeholder(k)).collect())
    }

    async fn tree(&self, prefix: &str, overrides: Option<&S3Options>) -> Result<Vec<TreeNode>> {
        let keys = self.all(prefix, overrides).await?;
        Ok(build_tree(&keys))
    }

    async fn list_buckets(&self, overrides: Option<&S3Options>) -> Result<Vec<String>> {
        self.gateway(overrides)?.list_buckets().await
    }
}
