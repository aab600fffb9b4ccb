//! # Cover Asset Errors

use thiserror::Error;

/// Result type for cover asset operations
pub type CoverResult<T> = Result<T, CoverError>;

/// Cover asset errors
#[derive(Debug, Clone, Error)]
pub enum CoverError {
    // Validation errors
    #[error("Cover payload is empty")]
    EmptyPayload,

    #[error("Cover too large: {0} bytes (max: {1})")]
    TooLarge(u64, u64),

    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // Object errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),
}

impl CoverError {
    /// Whether the caller supplied a bad cover, as opposed to a backend failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CoverError::EmptyPayload
                | CoverError::TooLarge(_, _)
                | CoverError::InvalidMimeType(_)
                | CoverError::InvalidKey(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections() {
        assert!(CoverError::EmptyPayload.is_rejection());
        assert!(CoverError::TooLarge(10, 5).is_rejection());
        assert!(CoverError::InvalidMimeType("text/plain".into()).is_rejection());
        assert!(!CoverError::IoError("disk".into()).is_rejection());
        assert!(!CoverError::ObjectNotFound("k".into()).is_rejection());
    }

    #[test]
    fn test_too_large_message() {
        let msg = CoverError::TooLarge(100, 50).to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }
}
