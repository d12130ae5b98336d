//! Bun-style S3 client / S3对象存储客户端
//!
//! `S3Client` owns the default configuration, `S3File` is a lazy handle on
//! one key, and `build_tree` folds a flat key listing into directories.

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod file;
pub mod models;
pub mod storage;
pub mod tree;
pub mod utils;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use client::{ObjectStorage, S3Client};
pub use config::{PresignMethod, PresignOptions, S3Options};
pub use download::{FetchResponse, Fetcher, HttpFetcher};
pub use drivers::s3::{S3Connector, S3Gateway};
pub use error::{Result, S3Error};
pub use file::S3File;
pub use models::{ListResult, S3Stats, WriteData};
pub use storage::{ByteStream, Connector, MemoryStore, ObjectGateway};
pub use tree::{build_tree, NodeKind, TreeBuilder, TreeNode};
