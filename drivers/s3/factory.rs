//! S3驱动工厂

use std::sync::Arc;

use crate::config::S3Options;
use crate::error::Result;
use crate::storage::{Connector, ObjectGateway};
use super::driver::S3Gateway;

/// S3驱动工厂，每组配置构建一个网关
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Connector;

impl Connector for S3Connector {
    fn connect(&self, options: &S3Options) -> Result<Arc<dyn ObjectGateway>> {
        tracing::debug!(
            "S3 connect: bucket={}, endpoint={}, path_style={}",
            options.bucket_name(),
            options.endpoint_or_default(),
            options.force_path_style.unwrap_or(false)
        );
        Ok(Arc::new(S3Gateway::new(options)?))
    }
}
