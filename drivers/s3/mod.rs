//! S3 compatible object storage driver / S3兼容对象存储驱动

pub mod driver;
pub mod factory;

pub use driver::S3Gateway;
pub use factory::S3Connector;
