//! Photo upload pipeline
//!
//! A batch goes through the validator as a whole before anything is written.
//! Declared types and sniffed magic bytes must both be on the allow-list.
//! Each accepted file then gets a fresh key and is written to the object
//! store in input order. A storage failure aborts the rest of the batch;
//! objects already written stay where they are.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

pub mod keys;
pub mod uploader;
pub mod validator;

pub use keys::{Clock, EntropySource, FixedClock, FixedEntropy, KeyGenerator, OsEntropy, SystemClock};
pub use uploader::StorageUploader;
pub use validator::UploadValidator;

/// Multipart field that carries photos
pub const FIELD_NAME: &str = "photos";

/// Every generated key lives under this prefix
pub const KEY_PREFIX: &str = "uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No files were uploaded")]
    NoFiles,

    #[error("Too many files: at most {max} per request")]
    TooManyFiles { max: usize },

    #[error("Unsupported file type {mime_type}; allowed types: {allowed}")]
    UnsupportedMediaType { mime_type: String, allowed: String },

    #[error("File {name} exceeds the maximum size of {max_bytes} bytes")]
    PayloadTooLarge { name: String, max_bytes: u64 },

    #[error("Unexpected file field '{0}'; send photos under 'photos'")]
    UnexpectedField(String),

    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

/// One uploaded file as received, never mutated
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub original_name: String,
    pub mime_type: String,
    pub content: Bytes,
}

impl FileBlob {
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            content: content.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub bucket: String,
}

/// Validator, key generator and uploader wired together
#[derive(Clone)]
pub struct UploadService {
    validator: UploadValidator,
    keys: KeyGenerator,
    uploader: StorageUploader,
}

impl UploadService {
    pub fn new(validator: UploadValidator, keys: KeyGenerator, uploader: StorageUploader) -> Self {
        Self {
            validator,
            keys,
            uploader,
        }
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn uploader(&self) -> &StorageUploader {
        &self.uploader
    }

    /// Validate the whole batch, then store each file in order
    pub async fn upload_batch(&self, files: Vec<FileBlob>) -> Result<Vec<StoredObject>, UploadError> {
        self.validator.validate_batch(&files)?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let key = self.keys.generate(&file.original_name);
            stored.push(self.uploader.store(&file, key).await?);
        }

        tracing::info!(
            count = stored.len(),
            bucket = %self.uploader.bucket(),
            "Upload batch stored"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UploadLimits, Visibility};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;
    use std::time::Duration;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    fn service(storage: Arc<MemoryStorage>) -> UploadService {
        UploadService::new(
            UploadValidator::new(UploadLimits::default()),
            KeyGenerator::new(Arc::new(FixedClock(7)), Arc::new(OsEntropy)),
            StorageUploader::new(storage, Visibility::Public, Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn stores_files_in_input_order() {
        let storage = Arc::new(MemoryStorage::new("photos"));
        let files = vec![
            FileBlob::new("first.png", "image/png", PNG),
            FileBlob::new("second.png", "image/png", PNG),
            FileBlob::new("third.png", "image/png", PNG),
        ];

        let stored = service(storage.clone()).upload_batch(files).await.unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored[0].key.ends_with("-first.png"));
        assert!(stored[1].key.ends_with("-second.png"));
        assert!(stored[2].key.ends_with("-third.png"));
        assert!(stored.iter().all(|s| s.bucket == "photos"));
        assert_eq!(storage.object_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn one_bad_file_rejects_the_whole_batch() {
        let storage = Arc::new(MemoryStorage::new("photos"));
        let files = vec![
            FileBlob::new("ok.png", "image/png", PNG),
            FileBlob::new("doc.pdf", "application/pdf", &b"%PDF-1.4"[..]),
        ];

        let err = service(storage.clone()).upload_batch(files).await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedMediaType { .. }));
        assert_eq!(storage.object_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mislabeled_document_is_not_stored() {
        let storage = Arc::new(MemoryStorage::new("photos"));
        let files = vec![
            FileBlob::new("ok.png", "image/png", PNG),
            FileBlob::new("x.png", "image/png", &b"%PDF-1.4\n"[..]),
        ];

        let err = service(storage.clone()).upload_batch(files).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::UnsupportedMediaType { ref mime_type, .. } if mime_type == "application/pdf"
        ));
        assert_eq!(storage.object_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn storage_failure_surfaces_as_unavailable() {
        let storage = Arc::new(MemoryStorage::unavailable("photos"));
        let err = service(storage)
            .upload_batch(vec![FileBlob::new("a.png", "image/png", PNG)])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::StorageUnavailable(_)));
    }
}
