//! S3驱动核心实现
//!
//! 设计原则：
//! - 只提供原语（put, head, delete, list, presign）
//! - 不做分片上传、重试和缓存
//! - rust-s3 未启用 fail-on-err，状态码由本层检查

use async_trait::async_trait;
use bytes::Bytes;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::Region;

use crate::config::{PresignMethod, S3Options};
use crate::error::{Result, S3Error};
use crate::storage::{HeadRecord, ObjectGateway, ObjectListing};
use crate::utils::parse_http_date;

/// S3 gateway backed by rust-s3 / S3网关
pub struct S3Gateway {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
}

impl S3Gateway {
    /// 创建新的S3网关实例
    pub fn new(options: &S3Options) -> Result<Self> {
        let credentials = Self::create_credentials(options)?;
        let region = Region::Custom {
            region: options.region_or_default().to_string(),
            endpoint: options.endpoint_or_default(),
        };
        let bucket = Self::create_bucket(options, region.clone(), credentials.clone())?;
        Ok(Self { bucket, region, credentials })
    }

    fn create_credentials(options: &S3Options) -> Result<Credentials> {
        let session_token = options.session_token.as_deref().filter(|t| !t.is_empty());
        Credentials::new(
            options.access_key_id.as_deref(),
            options.secret_access_key.as_deref(),
            session_token,
            None,
            None,
        )
        .map_err(|e| S3Error::Configuration(format!("创建S3凭证失败: {}", e)))
    }

    /// 创建S3 Bucket客户端
    fn create_bucket(options: &S3Options, region: Region, credentials: Credentials) -> Result<Box<Bucket>> {
        let bucket = Bucket::new(options.bucket_name(), region, credentials)
            .map_err(|e| S3Error::Configuration(format!("创建S3 Bucket失败: {}", e)))?;

        let bucket = if options.force_path_style.unwrap_or(false) {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(bucket)
    }
}

fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

#[async_trait]
impl ObjectGateway for S3Gateway {
    fn name(&self) -> &str {
        "S3"
    }

    fn bucket(&self) -> &str {
        &self.bucket.name
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str, acl: Option<&str>) -> Result<()> {
        let response = match acl {
            Some(acl) => {
                // ACL header only on this request
                let mut bucket = (*self.bucket).clone();
                bucket.add_header("x-amz-acl", acl);
                bucket.put_object_with_content_type(key, &body, content_type).await
            }
            None => self.bucket.put_object_with_content_type(key, &body, content_type).await,
        }
        .map_err(|e| S3Error::upload(key, e))?;

        let code = response.status_code();
        tracing::debug!("S3 PutObject: bucket={}, key={}, status={}", self.bucket.name, key, code);
        if !is_success(code) {
            tracing::warn!("S3 PutObject rejected: key={}, status={}", key, code);
            return Err(S3Error::upload(key, format!("HTTP {}", code)));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        let response = self.bucket
            .get_object(key)
            .await
            .map_err(|e| S3Error::Fetch(format!("获取S3对象失败: {}", e)))?;

        let code = response.status_code();
        if !is_success(code) {
            return Err(S3Error::Fetch(format!("获取S3对象失败: HTTP {}", code)));
        }
        Ok(response.bytes().clone())
    }

    async fn head(&self, key: &str) -> Result<HeadRecord> {
        let (head, code) = self.bucket
            .head_object(key)
            .await
            .map_err(|e| S3Error::stat(key, e))?;

        tracing::debug!("S3 HeadObject: key={}, status={}", key, code);
        if !is_success(code) {
            return Err(S3Error::stat(key, format!("HTTP {}", code)));
        }

        Ok(HeadRecord {
            content_length: head.content_length.map(|len| len.max(0) as u64),
            last_modified: head.last_modified.as_deref().and_then(parse_http_date),
            etag: head.e_tag,
            content_type: head.content_type,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self.bucket
            .delete_object(key)
            .await
            .map_err(|e| S3Error::delete(key, e))?;

        let code = response.status_code();
        tracing::debug!("S3 DeleteObject: key={}, status={}", key, code);
        if !is_success(code) {
            return Err(S3Error::delete(key, format!("HTTP {}", code)));
        }
        Ok(())
    }

    async fn list_objects(&self, prefix: &str, delimiter: Option<char>) -> Result<ObjectListing> {
        let results = self.bucket
            .list(prefix.to_string(), delimiter.map(|d| d.to_string()))
            .await
            .map_err(|e| S3Error::list(prefix, e))?;

        let mut listing = ObjectListing::default();
        // rust-s3 already follows continuation tokens, one result per page
        for result in results {
            listing.keys.extend(result.contents.into_iter().map(|obj| obj.key));
            listing.common_prefixes.extend(
                result.common_prefixes.unwrap_or_default().into_iter().map(|cp| cp.prefix),
            );
        }

        tracing::debug!(
            "S3 ListObjects: prefix={}, keys={}, prefixes={}",
            prefix,
            listing.keys.len(),
            listing.common_prefixes.len()
        );
        Ok(listing)
    }

    async fn presign(&self, key: &str, method: PresignMethod, expires_in: u32) -> Result<String> {
        let url = match method {
            PresignMethod::Get => self.bucket.presign_get(key, expires_in, None).await,
            PresignMethod::Put => self.bucket.presign_put(key, expires_in, None, None).await,
            PresignMethod::Delete => self.bucket.presign_delete(key, expires_in).await,
        };
        url.map_err(|e| S3Error::presign(key, format!("生成预签名URL失败: {}", e)))
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = Bucket::list_buckets(self.region.clone(), self.credentials.clone())
            .await
            .map_err(|e| S3Error::list("", e))?;
        Ok(response.bucket_names().collect())
    }
}
