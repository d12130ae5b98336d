//! Client configuration module / 客户端配置模块
//!
//! `S3Options` is immutable once handed to a client. Per-call overrides are
//! merged over the base into a new value, the base is never touched.

use serde::{Deserialize, Serialize};

/// Default region / 默认区域
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default presigned URL lifetime in seconds (24h) / 默认预签名有效期
pub const DEFAULT_PRESIGN_EXPIRES: u32 = 86_400;

/// S3 client options / S3客户端配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Options {
    /// Access Key ID
    pub access_key_id: Option<String>,
    /// Secret Access Key
    pub secret_access_key: Option<String>,
    /// Session Token（用于临时凭证）
    pub session_token: Option<String>,
    /// 存储桶名称
    pub bucket: Option<String>,
    /// 区域
    pub region: Option<String>,
    /// S3端点地址
    /// AWS: https://s3.{region}.amazonaws.com
    /// Cloudflare R2: https://<account-id>.r2.cloudflarestorage.com
    /// MinIO: http://localhost:9000
    pub endpoint: Option<String>,
    /// Canned ACL sent with uploads, e.g. "public-read" / 上传时的ACL
    pub acl: Option<String>,
    /// 强制使用路径风格（MinIO等需要设置为true）
    pub force_path_style: Option<bool>,
    /// Explicit content type for uploads / 上传内容类型
    #[serde(rename = "type")]
    pub content_type: Option<String>,
}

impl S3Options {
    pub fn new(access_key_id: &str, secret_access_key: &str, bucket: &str) -> Self {
        Self {
            access_key_id: Some(access_key_id.to_string()),
            secret_access_key: Some(secret_access_key.to_string()),
            bucket: Some(bucket.to_string()),
            ..Default::default()
        }
    }

    /// Load options from environment variables / 从环境变量加载配置
    pub fn from_env() -> Self {
        Self {
            access_key_id: env_var("AWS_ACCESS_KEY_ID"),
            secret_access_key: env_var("AWS_SECRET_ACCESS_KEY"),
            session_token: env_var("AWS_SESSION_TOKEN"),
            bucket: env_var("AWS_BUCKET_NAME").or_else(|| env_var("AWS_BUCKET")),
            region: env_var("AWS_REGION"),
            endpoint: env_var("S3_ENDPOINT").or_else(|| env_var("AWS_ENDPOINT")),
            acl: env_var("S3_ACL"),
            force_path_style: None,
            content_type: None,
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn session_token(mut self, token: &str) -> Self {
        self.session_token = Some(token.to_string());
        self
    }

    pub fn acl(mut self, acl: &str) -> Self {
        self.acl = Some(acl.to_string());
        self
    }

    pub fn path_style(mut self, enabled: bool) -> Self {
        self.force_path_style = Some(enabled);
        self
    }

    pub fn content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Both required credential fields present and non-empty / 凭证是否完整
    pub fn has_credentials(&self) -> bool {
        is_set(&self.access_key_id) && is_set(&self.secret_access_key)
    }

    /// Merge these options over `base`, set fields win / 合并配置（覆盖项优先）
    pub fn merged_over(&self, base: &S3Options) -> S3Options {
        S3Options {
            access_key_id: pick(&self.access_key_id, &base.access_key_id),
            secret_access_key: pick(&self.secret_access_key, &base.secret_access_key),
            session_token: pick(&self.session_token, &base.session_token),
            bucket: pick(&self.bucket, &base.bucket),
            region: pick(&self.region, &base.region),
            endpoint: pick(&self.endpoint, &base.endpoint),
            acl: pick(&self.acl, &base.acl),
            force_path_style: self.force_path_style.or(base.force_path_style),
            content_type: pick(&self.content_type, &base.content_type),
        }
    }

    pub fn region_or_default(&self) -> &str {
        self.region.as_deref().filter(|r| !r.is_empty()).unwrap_or(DEFAULT_REGION)
    }

    /// Configured endpoint, or the AWS endpoint for the region / 端点地址
    pub fn endpoint_or_default(&self) -> String {
        match self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", self.region_or_default()),
        }
    }

    pub fn bucket_name(&self) -> &str {
        self.bucket.as_deref().unwrap_or("")
    }
}

/// HTTP method a presigned URL is valid for / 预签名方法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PresignMethod {
    #[default]
    Get,
    Put,
    Delete,
}

/// Presign options / 预签名选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresignOptions {
    /// Lifetime in seconds / 有效期（秒）
    pub expires_in: u32,
    pub method: PresignMethod,
    /// Per-call configuration override / 单次调用配置覆盖
    #[serde(skip)]
    pub overrides: Option<S3Options>,
}

impl Default for PresignOptions {
    fn default() -> Self {
        Self {
            expires_in: DEFAULT_PRESIGN_EXPIRES,
            method: PresignMethod::Get,
            overrides: None,
        }
    }
}

impl PresignOptions {
    pub fn expires_in(mut self, secs: u32) -> Self {
        self.expires_in = secs;
        self
    }

    pub fn method(mut self, method: PresignMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_overrides(mut self, overrides: S3Options) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.is_empty()).unwrap_or(false)
}

fn pick(over: &Option<String>, base: &Option<String>) -> Option<String> {
    over.clone().or_else(|| base.clone())
}
