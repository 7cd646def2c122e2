use super::{FileBlob, UploadError};
use crate::config::UploadLimits;

/// Strip MIME parameters and lowercase: `Image/PNG; q=1` -> `image/png`
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// `image/jpg` and `image/pjpeg` are aliases of `image/jpeg`
pub fn canonical_mime_type(content_type: &str) -> String {
    let normalized = normalize_mime_type(content_type);
    match normalized.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => normalized,
    }
}

/// Pure checks over file metadata and content; never touches storage
#[derive(Debug, Clone)]
pub struct UploadValidator {
    limits: UploadLimits,
}

impl UploadValidator {
    pub fn new(limits: UploadLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    pub fn check_count(&self, count: usize) -> Result<(), UploadError> {
        if count == 0 {
            return Err(UploadError::NoFiles);
        }
        if count > self.limits.max_files {
            return Err(UploadError::TooManyFiles {
                max: self.limits.max_files,
            });
        }
        Ok(())
    }

    pub fn check_mime_type(&self, mime_type: &str) -> Result<(), UploadError> {
        let canonical = canonical_mime_type(mime_type);
        if self
            .limits
            .allowed_mime_types
            .iter()
            .any(|allowed| canonical_mime_type(allowed) == canonical)
        {
            return Ok(());
        }
        Err(UploadError::UnsupportedMediaType {
            mime_type: normalize_mime_type(mime_type),
            allowed: self.limits.allowed_mime_types.join(", "),
        })
    }

    pub fn check_size(&self, name: &str, size_bytes: u64) -> Result<(), UploadError> {
        if size_bytes > self.limits.max_file_bytes {
            return Err(UploadError::PayloadTooLarge {
                name: name.to_string(),
                max_bytes: self.limits.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Recognised magic bytes must also be an allowed type. Content `infer`
    /// cannot identify is judged by its declared type alone.
    pub fn check_content(&self, file: &FileBlob) -> Result<(), UploadError> {
        match infer::get(&file.content) {
            Some(kind) => self.check_mime_type(kind.mime_type()),
            None => Ok(()),
        }
    }

    pub fn check_file(&self, file: &FileBlob) -> Result<(), UploadError> {
        self.check_mime_type(&file.mime_type)?;
        self.check_size(&file.original_name, file.size_bytes())?;
        self.check_content(file)
    }

    /// First failing file wins
    pub fn validate_batch(&self, files: &[FileBlob]) -> Result<(), UploadError> {
        self.check_count(files.len())?;
        files.iter().try_for_each(|file| self.check_file(file))
    }
}
