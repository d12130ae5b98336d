//! Error taxonomy / 错误类型
//!
//! Each gateway produces the variant matching the operation it performs;
//! the client and file handles propagate these unchanged.

use thiserror::Error;

/// S3 bridge errors / S3错误
#[derive(Error, Debug)]
pub enum S3Error {
    /// Missing or invalid credentials, detected before any network attempt / 配置错误
    #[error("configuration error: {0}")]
    Configuration(String),

    /// PUT rejected (auth, network, bucket) / 上传失败
    #[error("upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    /// DELETE rejected / 删除失败
    #[error("delete of '{key}' failed: {message}")]
    Delete { key: String, message: String },

    /// HEAD rejected, including missing objects / 获取元数据失败
    #[error("stat of '{key}' failed: {message}")]
    Stat { key: String, message: String },

    /// Listing objects or buckets rejected / 列出失败
    #[error("listing '{prefix}' failed: {message}")]
    List { prefix: String, message: String },

    /// URL signing failed / 预签名失败
    #[error("presign of '{key}' failed: {message}")]
    Presign { key: String, message: String },

    /// Transport failure reaching a presigned URL / 下载失败
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Fetched content could not be decoded / 解析失败
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for S3Error {
    fn from(err: serde_json::Error) -> Self {
        S3Error::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, S3Error>;

impl S3Error {
    pub(crate) fn upload(key: &str, message: impl ToString) -> Self {
        S3Error::Upload { key: key.to_string(), message: message.to_string() }
    }

    pub(crate) fn delete(key: &str, message: impl ToString) -> Self {
        S3Error::Delete { key: key.to_string(), message: message.to_string() }
    }

    pub(crate) fn stat(key: &str, message: impl ToString) -> Self {
        S3Error::Stat { key: key.to_string(), message: message.to_string() }
    }

    pub(crate) fn list(prefix: &str, message: impl ToString) -> Self {
        S3Error::List { prefix: prefix.to_string(), message: message.to_string() }
    }

    pub(crate) fn presign(key: &str, message: impl ToString) -> Self {
        S3Error::Presign { key: key.to_string(), message: message.to_string() }
    }
}
