//! In-memory object store / 内存对象存储
//!
//! Behaves like a bucket server for local development and tests. Buckets
//! must be created up front. Presigned URLs use the
//! `memory://{bucket}/object?key={key}` scheme and are resolved by
//! `MemoryFetcher` against the same store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{Connector, HeadRecord, ObjectGateway, ObjectListing};
use crate::client::S3Client;
use crate::config::{PresignMethod, S3Options};
use crate::download::{FetchResponse, Fetcher};
use crate::error::{Result, S3Error};

const SCHEME: &str = "memory";

/// Stored object / 存储的对象
#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
    acl: Option<String>,
}

/// Shared in-memory store (bucket -> key -> object) / 共享内存存储
#[derive(Clone, Default)]
pub struct MemoryStore {
    buckets: Arc<RwLock<BTreeMap<String, BTreeMap<String, StoredObject>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bucket / 创建存储桶
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    /// Client wired to this store / 创建绑定此存储的客户端
    pub fn client(&self, options: S3Options) -> Result<S3Client> {
        S3Client::with_backends(
            options,
            Arc::new(MemoryConnector::new(self.clone())),
            Arc::new(MemoryFetcher::new(self.clone())),
        )
    }

    /// Raw object bytes, bypassing the gateway / 直接读取对象
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets.read().get(bucket)?.get(key).map(|o| o.data.clone())
    }

    /// ACL the object was stored with / 对象的ACL
    pub fn object_acl(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets.read().get(bucket)?.get(key)?.acl.clone()
    }

    fn lookup(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets.read().get(bucket)?.get(key).cloned()
    }
}

/// Connector producing in-memory gateways / 内存网关构造器
#[derive(Clone, Default)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, options: &S3Options) -> Result<Arc<dyn ObjectGateway>> {
        Ok(Arc::new(MemoryGateway {
            store: self.store.clone(),
            bucket: options.bucket_name().to_string(),
        }))
    }
}

/// Gateway over a `MemoryStore` bucket / 内存网关
pub struct MemoryGateway {
    store: MemoryStore,
    bucket: String,
}

impl MemoryGateway {
    pub fn new(store: MemoryStore, bucket: &str) -> Self {
        Self { store, bucket: bucket.to_string() }
    }
}

#[async_trait]
impl ObjectGateway for MemoryGateway {
    fn name(&self) -> &str {
        "memory"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str, acl: Option<&str>) -> Result<()> {
        let object = StoredObject {
            etag: format!("\"{:x}\"", md5::compute(&body)),
            data: body,
            content_type: content_type.to_string(),
            last_modified: Utc::now(),
            acl: acl.map(|a| a.to_string()),
        };
        let mut buckets = self.store.buckets.write();
        let objects = buckets
            .get_mut(&self.bucket)
            .ok_or_else(|| S3Error::upload(key, format!("NoSuchBucket: {}", self.bucket)))?;
        objects.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        self.store
            .lookup(&self.bucket, key)
            .map(|o| o.data)
            .ok_or_else(|| S3Error::Fetch(format!("NoSuchKey: {}", key)))
    }

    async fn head(&self, key: &str) -> Result<HeadRecord> {
        let object = self.store
            .lookup(&self.bucket, key)
            .ok_or_else(|| S3Error::stat(key, "HTTP 404"))?;
        Ok(HeadRecord {
            content_length: Some(object.data.len() as u64),
            last_modified: Some(object.last_modified),
            etag: Some(object.etag),
            content_type: Some(object.content_type),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // S3 returns 204 for missing keys too / 不存在也视为成功
        if let Some(objects) = self.store.buckets.write().get_mut(&self.bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list_objects(&self, prefix: &str, delimiter: Option<char>) -> Result<ObjectListing> {
        let buckets = self.store.buckets.read();
        let objects = buckets
            .get(&self.bucket)
            .ok_or_else(|| S3Error::list(prefix, format!("NoSuchBucket: {}", self.bucket)))?;

        let mut listing = ObjectListing::default();
        let mut seen_prefixes = BTreeSet::new();
        for key in objects.keys().filter(|k| k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            match delimiter.and_then(|d| rest.find(d).map(|pos| pos + d.len_utf8())) {
                Some(end) => {
                    let common = format!("{}{}", prefix, &rest[..end]);
                    if seen_prefixes.insert(common.clone()) {
                        listing.common_prefixes.push(common);
                    }
                }
                None => listing.keys.push(key.clone()),
            }
        }
        Ok(listing)
    }

    async fn presign(&self, key: &str, method: PresignMethod, expires_in: u32) -> Result<String> {
        if expires_in == 0 || expires_in > 604_800 {
            return Err(S3Error::presign(key, format!("invalid expiry: {}s", expires_in)));
        }
        let method = match method {
            PresignMethod::Get => "GET",
            PresignMethod::Put => "PUT",
            PresignMethod::Delete => "DELETE",
        };
        // key travels in the query, the path would normalize "." and ".."
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("key", key)
            .append_pair("method", method)
            .append_pair("expires", &expires_in.to_string())
            .finish();
        Ok(format!("{}://{}/object?{}", SCHEME, self.bucket, query))
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.store.buckets.read().keys().cloned().collect())
    }
}

/// Transport resolving `memory://` URLs / 内存URL下载器
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    store: MemoryStore,
}

impl MemoryFetcher {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let parsed = url::Url::parse(url).map_err(|e| S3Error::Fetch(e.to_string()))?;
        if parsed.scheme() != SCHEME {
            return Err(S3Error::Fetch(format!("unsupported scheme: {}", parsed.scheme())));
        }
        let bucket = parsed.host_str().unwrap_or("");
        let key = parsed
            .query_pairs()
            .find(|(name, _)| name == "key")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| S3Error::Fetch(format!("missing key in {}", url)))?;

        let object = self.store
            .lookup(bucket, &key)
            .ok_or_else(|| S3Error::Fetch("HTTP 404 Not Found".to_string()))?;

        let StoredObject { data, content_type, .. } = object;
        let body = futures::stream::once(async move { Ok::<_, std::io::Error>(data) });
        Ok(FetchResponse::new(200, Some(content_type), Some(Box::pin(body))))
    }
}
