//! Object storage abstraction
//!
//! The upload pipeline only needs to write a blob under a key and turn that
//! key into a retrieval URL. `S3Storage` talks to S3 or an S3-compatible
//! provider; `MemoryStorage` keeps objects in process for tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

pub mod memory;
pub mod s3;

pub use memory::MemoryStorage;
pub use s3::S3Storage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("Bucket check failed for {bucket}: {reason}")]
    BucketUnavailable { bucket: String, reason: String },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn bucket(&self) -> &str;

    /// Write `data` under `key`, tagging it with `content_type`
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()>;

    /// Plain object URL, valid when the bucket allows public reads
    fn public_url(&self, key: &str) -> String;

    /// Pre-signed GET URL valid for `ttl`
    async fn signed_url(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Fails when `prefix` cannot be listed with the configured credentials
    async fn check_bucket(&self, prefix: &str) -> StorageResult<()>;
}
