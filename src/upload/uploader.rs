use std::sync::Arc;
use std::time::Duration;

use super::validator::canonical_mime_type;
use super::{FileBlob, StoredObject, UploadError, KEY_PREFIX};
use crate::config::{StorageConfig, Visibility};
use crate::storage::{ObjectStorage, StorageResult};

/// Content type from magic bytes, falling back to what the client declared
pub fn sniff_content_type(content: &[u8], declared: &str) -> String {
    match infer::get(content) {
        Some(kind) => kind.mime_type().to_string(),
        None => canonical_mime_type(declared),
    }
}

/// Writes validated blobs and hands back their retrieval URLs
#[derive(Clone)]
pub struct StorageUploader {
    storage: Arc<dyn ObjectStorage>,
    visibility: Visibility,
    signed_url_ttl: Duration,
}

impl StorageUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>, visibility: Visibility, signed_url_ttl: Duration) -> Self {
        Self {
            storage,
            visibility,
            signed_url_ttl,
        }
    }

    pub fn from_config(storage: Arc<dyn ObjectStorage>, config: &StorageConfig) -> Self {
        Self::new(
            storage,
            config.visibility,
            Duration::from_secs(config.signed_url_ttl_secs),
        )
    }

    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    /// Startup check; the server must not come up against an unreachable bucket
    pub async fn preflight(&self) -> StorageResult<()> {
        self.storage.check_bucket(KEY_PREFIX).await
    }

    pub async fn store(&self, file: &FileBlob, key: String) -> Result<StoredObject, UploadError> {
        let content_type = sniff_content_type(&file.content, &file.mime_type);
        self.storage
            .put(&key, &content_type, file.content.clone())
            .await?;

        let url = match self.visibility {
            Visibility::Public => self.storage.public_url(&key),
            Visibility::Private => self.storage.signed_url(&key, self.signed_url_ttl).await?,
        };

        tracing::debug!(key = %key, content_type = %content_type, "Stored upload");
        Ok(StoredObject {
            key,
            url,
            bucket: self.storage.bucket().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    #[test]
    fn magic_bytes_beat_the_declared_type() {
        assert_eq!(sniff_content_type(JPEG, "image/png"), "image/jpeg");
        assert_eq!(sniff_content_type(b"????", "image/PNG; x=y"), "image/png");
        assert_eq!(sniff_content_type(b"????", "image/jpg"), "image/jpeg");
    }

    #[tokio::test]
    async fn public_visibility_returns_plain_url() {
        let storage = Arc::new(MemoryStorage::new("b"));
        let uploader = StorageUploader::new(storage.clone(), Visibility::Public, Duration::from_secs(60));

        let stored = uploader
            .store(&FileBlob::new("a.jpg", "image/png", JPEG), "uploads/a.jpg".into())
            .await
            .unwrap();
        assert_eq!(stored.url, "memory://b/uploads/a.jpg");

        let (_, content_type) = storage.object("uploads/a.jpg").await.unwrap();
        assert_eq!(content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn private_visibility_returns_signed_url() {
        let storage = Arc::new(MemoryStorage::new("b"));
        let uploader = StorageUploader::new(storage, Visibility::Private, Duration::from_secs(90));

        let stored = uploader
            .store(&FileBlob::new("a.jpg", "image/jpeg", JPEG), "uploads/a.jpg".into())
            .await
            .unwrap();
        assert_eq!(stored.url, "memory://b/uploads/a.jpg?expires=90");
    }

    #[tokio::test]
    async fn preflight_fails_on_unreachable_bucket() {
        let uploader = StorageUploader::new(
            Arc::new(MemoryStorage::unavailable("b")),
            Visibility::Public,
            Duration::from_secs(60),
        );
        assert!(matches!(
            uploader.preflight().await,
            Err(StorageError::BucketUnavailable { .. })
        ));
    }
}
