//! # Blob Backend Trait

use super::errors::CoverResult;

/// Backend trait for cover blob storage
pub trait BlobBackend: Send + Sync + std::fmt::Debug {
    /// Write data under key, replacing any existing object
    fn write(&self, key: &str, data: &[u8]) -> CoverResult<()>;

    /// Read the object stored under key
    fn read(&self, key: &str) -> CoverResult<Vec<u8>>;

    /// Delete the object stored under key
    fn delete(&self, key: &str) -> CoverResult<()>;

    /// Check if key exists
    fn exists(&self, key: &str) -> CoverResult<bool>;
}
