//! Image blob storage
//!
//! Profile and project images are uploaded before the record that refers to
//! them is created. The store accepts the raw bytes, persists them, and
//! returns a public reference (URL) synchronously; records only ever hold
//! that reference.
//!
//! Only PNG and JPEG are accepted. The declared content type must be one of
//! `image/png`, `image/jpeg` or `image/jpg`, and the payload's leading bytes
//! must match it.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Error type for blob operations
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Content type is not PNG/JPEG, or the bytes do not match it
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    /// Payload exceeds the configured limit
    #[error("Image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    /// Payload is empty
    #[error("Image is empty")]
    Empty,

    /// Filesystem failure
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Parses a `Content-Type` value, ignoring parameters and case
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }

    fn matches(&self, data: &[u8]) -> bool {
        match self {
            ImageKind::Png => data.starts_with(PNG_SIGNATURE),
            ImageKind::Jpeg => data.starts_with(JPEG_SIGNATURE),
        }
    }
}

/// Checks type, signature and size of an upload
pub fn validate_image(data: &[u8], content_type: &str, max_bytes: usize) -> Result<ImageKind, BlobError> {
    let kind = ImageKind::from_content_type(content_type)
        .ok_or_else(|| BlobError::UnsupportedType(content_type.to_string()))?;

    if data.is_empty() {
        return Err(BlobError::Empty);
    }

    if data.len() > max_bytes {
        return Err(BlobError::TooLarge {
            size: data.len(),
            max: max_bytes,
        });
    }

    if !kind.matches(data) {
        return Err(BlobError::UnsupportedType(format!(
            "{} (content does not match)",
            content_type
        )));
    }

    Ok(kind)
}

/// Opaque image store returning public references
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores an image and returns its public reference
    async fn put(&self, data: Bytes, content_type: &str) -> Result<String, BlobError>;

    /// Largest accepted payload in bytes
    fn max_bytes(&self) -> usize;
}

/// Writes images to a local directory under random names
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalBlobStore {
    /// `public_base_url` is joined with `/<dir file name>/<file>` to build
    /// references, e.g. `http://localhost:5000/images/<uuid>.png`
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn reference_for(&self, file_name: &str) -> String {
        let prefix = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "images".to_string());

        format!("{}/{}/{}", self.public_base_url, prefix, file_name)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, data: Bytes, content_type: &str) -> Result<String, BlobError> {
        let kind = validate_image(&data, content_type, self.max_bytes)?;

        fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        fs::write(self.dir.join(&file_name), &data).await?;

        debug!(file = %file_name, size = data.len(), "Image stored");

        Ok(self.reference_for(&file_name))
    }

    fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}
