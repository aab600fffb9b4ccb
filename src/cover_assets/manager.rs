//! # Cover Asset Manager
//!
//! Stores cover images in a blob backend and hands out stable public URLs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::backend::BlobBackend;
use super::errors::{CoverError, CoverResult};

/// Cover storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Base URL under which stored keys are publicly reachable
    pub public_base_url: String,
    /// Key prefix for every cover object
    pub key_prefix: String,
    /// Accepted MIME types
    pub allowed_mime_types: Vec<String>,
    /// Max cover size in bytes
    pub max_size: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8080/assets".to_string(),
            key_prefix: "covers".to_string(),
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
                "image/gif".to_string(),
            ],
            max_size: 5 * 1024 * 1024,
        }
    }
}

impl CoverConfig {
    /// Check if MIME type is allowed
    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime_type)
    }
}

/// File extension used when storing a cover of the given MIME type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// MIME type to serve a stored key with
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Upload/delete capability for book covers
#[derive(Debug, Clone)]
pub struct CoverAssetManager {
    backend: Arc<dyn BlobBackend>,
    config: CoverConfig,
}

impl CoverAssetManager {
    /// Create a manager over a backend
    pub fn new(backend: Arc<dyn BlobBackend>, config: CoverConfig) -> Self {
        Self { backend, config }
    }

    /// Active configuration
    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Content-addressed key for a book's cover.
    ///
    /// Different images for the same book get different keys, so a
    /// replacement never overwrites the cover it replaces.
    pub fn key_for(&self, book_id: &str, data: &[u8], content_type: &str) -> String {
        let digest = Sha256::digest(data);
        let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        format!(
            "{}/{}/{}.{}",
            self.config.key_prefix,
            book_id,
            hex,
            extension_for(content_type)
        )
    }

    /// Public URL of a stored key
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url.trim_end_matches('/'), key)
    }

    /// Recover the key from a URL produced by [`url_for`](Self::url_for)
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let base = self.config.public_base_url.trim_end_matches('/');
        url.strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    /// Validate and store a cover, returning its public URL
    pub fn upload(&self, data: &[u8], content_type: &str, key: &str) -> CoverResult<String> {
        if data.is_empty() {
            return Err(CoverError::EmptyPayload);
        }
        let size = data.len() as u64;
        if size > self.config.max_size {
            return Err(CoverError::TooLarge(size, self.config.max_size));
        }
        if !self.config.is_mime_allowed(content_type) {
            return Err(CoverError::InvalidMimeType(content_type.to_string()));
        }

        // Keys from `key_for` are content-addressed: an existing object
        // already holds these bytes.
        if !self.backend.exists(key)? {
            self.backend.write(key, data)?;
        }
        Ok(self.url_for(key))
    }

    /// Fetch a stored cover
    pub fn read(&self, key: &str) -> CoverResult<Vec<u8>> {
        self.backend.read(key)
    }

    /// Remove a stored cover
    pub fn delete(&self, key: &str) -> CoverResult<()> {
        self.backend.delete(key)
    }
}
