//! # Record Store Errors

use thiserror::Error;

/// Result type for record store operations
pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

/// Record store errors
#[derive(Debug, Clone, Error)]
pub enum RecordStoreError {
    // Key errors
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Version mismatch on {id}: expected {expected}, found {actual}")]
    VersionMismatch { id: String, expected: u64, actual: u64 },

    #[error("No updatable attributes supplied for {0}")]
    EmptyUpdate(String),

    // Journal errors
    #[error("Journal corruption at offset {offset}: {detail}")]
    Corruption { offset: u64, detail: String },

    #[error("Journal fsync failed: {0}")]
    FsyncFailed(String),

    #[error("Journal is read-only after an earlier failure: {0}")]
    Poisoned(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecordStoreError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            RecordStoreError::NotFound(_) => "LIBRIS_STORE_NOT_FOUND",
            RecordStoreError::VersionMismatch { .. } => "LIBRIS_STORE_VERSION_MISMATCH",
            RecordStoreError::EmptyUpdate(_) => "LIBRIS_STORE_EMPTY_UPDATE",
            RecordStoreError::Corruption { .. } => "LIBRIS_STORE_CORRUPTION",
            RecordStoreError::FsyncFailed(_) => "LIBRIS_STORE_FSYNC_FAILED",
            RecordStoreError::Poisoned(_) => "LIBRIS_STORE_POISONED",
            RecordStoreError::Serialization(_) => "LIBRIS_STORE_SERIALIZATION",
            RecordStoreError::IoError(_) => "LIBRIS_STORE_IO_ERROR",
            RecordStoreError::Internal(_) => "LIBRIS_STORE_INTERNAL",
        }
    }

    /// Whether the store is unusable after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RecordStoreError::Corruption { .. }
                | RecordStoreError::FsyncFailed(_)
                | RecordStoreError::Poisoned(_)
        )
    }
}

impl From<serde_json::Error> for RecordStoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            RecordStoreError::NotFound("b1".into()).code(),
            "LIBRIS_STORE_NOT_FOUND"
        );
        assert_eq!(
            RecordStoreError::VersionMismatch {
                id: "b1".into(),
                expected: 1,
                actual: 2
            }
            .code(),
            "LIBRIS_STORE_VERSION_MISMATCH"
        );
    }

    #[test]
    fn test_fatal_errors() {
        assert!(RecordStoreError::Corruption {
            offset: 0,
            detail: "bad".into()
        }
        .is_fatal());
        assert!(RecordStoreError::FsyncFailed("EIO".into()).is_fatal());
        assert!(RecordStoreError::Poisoned("EIO".into()).is_fatal());
        assert!(!RecordStoreError::IoError("disk".into()).is_fatal());
    }

    #[test]
    fn test_version_mismatch_message() {
        let err = RecordStoreError::VersionMismatch {
            id: "b1".into(),
            expected: 3,
            actual: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("found 5"));
    }
}
