use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{ObjectStorage, StorageError, StorageResult};

/// In-process bucket backed by `object_store::memory::InMemory`
pub struct MemoryStorage {
    store: InMemory,
    bucket: String,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            store: InMemory::new(),
            bucket: bucket.into(),
            unavailable: AtomicBool::new(false),
        }
    }

    /// A bucket whose every call fails, for exercising error paths
    pub fn unavailable(bucket: impl Into<String>) -> Self {
        let storage = Self::new(bucket);
        storage.set_unavailable(true);
        storage
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!(
                "bucket {} is unreachable",
                self.bucket
            )));
        }
        Ok(())
    }

    pub async fn object_count(&self) -> StorageResult<usize> {
        let objects: Vec<_> = self
            .store
            .list(None)
            .try_collect()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(objects.len())
    }

    /// Stored bytes and content type for `key`
    pub async fn object(&self, key: &str) -> StorageResult<(Bytes, Option<String>)> {
        let result = self
            .store
            .get(&Path::from(key))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());
        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok((data, content_type))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        self.ensure_available()?;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };
        self.store
            .put_opts(&Path::from(key), PutPayload::from(data), opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        self.ensure_available()?;
        Ok(format!("{}?expires={}", self.public_url(key), ttl.as_secs()))
    }

    async fn check_bucket(&self, prefix: &str) -> StorageResult<()> {
        self.ensure_available()
            .map_err(|e| StorageError::BucketUnavailable {
                bucket: self.bucket.clone(),
                reason: e.to_string(),
            })?;
        self.store
            .list_with_delimiter(Some(&Path::from(prefix)))
            .await
            .map_err(|e| StorageError::BucketUnavailable {
                bucket: self.bucket.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_bytes_and_content_type() {
        let storage = MemoryStorage::new("test");
        storage
            .put("uploads/a.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        let (data, content_type) = storage.object("uploads/a.png").await.unwrap();
        assert_eq!(&data[..], b"png");
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(storage.object_count().await.unwrap(), 1);
        assert_eq!(storage.public_url("uploads/a.png"), "memory://test/uploads/a.png");
    }

    #[tokio::test]
    async fn unavailable_bucket_fails_every_call() {
        let storage = MemoryStorage::unavailable("test");
        assert!(matches!(
            storage.check_bucket("uploads").await,
            Err(StorageError::BucketUnavailable { .. })
        ));
        assert!(storage
            .put("uploads/a.png", "image/png", Bytes::new())
            .await
            .is_err());
        assert_eq!(storage.object_count().await.unwrap(), 0);
    }
}
