//! # Inventory Errors

use thiserror::Error;

use crate::catalog::RuleViolation;
use crate::cover_assets::CoverError;
use crate::record_store::RecordStoreError;

/// Result type for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Caller-visible failures of the inventory service
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    // Validation
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    // Preconditions
    #[error("Book not found: {0}")]
    NotFound(String),

    #[error("No copies of book {0} are available")]
    Unavailable(String),

    #[error("User {user_id} already has an active borrow of book {book_id}")]
    AlreadyBorrowed { book_id: String, user_id: String },

    #[error("User {user_id} has no active borrow of book {book_id}")]
    NoActiveBorrow { book_id: String, user_id: String },

    #[error("Book {book_id} kept changing, gave up after {attempts} attempts")]
    ConcurrencyConflict { book_id: String, attempts: u32 },

    // Backends
    #[error("Storage failure: {0}")]
    StorageFailure(#[source] RecordStoreError),

    #[error("Cover upload failure: {0}")]
    UploadFailure(#[source] CoverError),
}

impl InventoryError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the book id to a rule violation
    pub fn from_rule(book_id: &str, violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::InvalidArgument { field, reason } => Self::invalid(field, reason),
            RuleViolation::Unavailable => Self::Unavailable(book_id.to_string()),
            RuleViolation::AlreadyBorrowed { user_id } => Self::AlreadyBorrowed {
                book_id: book_id.to_string(),
                user_id,
            },
            RuleViolation::NoActiveBorrow { user_id } => Self::NoActiveBorrow {
                book_id: book_id.to_string(),
                user_id,
            },
        }
    }

    /// Map a store error for the given book; a missing key becomes `NotFound`
    pub fn from_store(book_id: &str, err: RecordStoreError) -> Self {
        match err {
            RecordStoreError::NotFound(_) => Self::NotFound(book_id.to_string()),
            other => Self::StorageFailure(other),
        }
    }

    /// Map a cover error; a rejected payload is the caller's fault
    pub fn from_cover(err: CoverError) -> Self {
        if err.is_rejection() {
            Self::invalid("cover", err.to_string())
        } else {
            Self::UploadFailure(err)
        }
    }

    /// HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            InventoryError::InvalidArgument { .. } => 400,
            InventoryError::NotFound(_) => 404,
            InventoryError::Unavailable(_) => 409,
            InventoryError::AlreadyBorrowed { .. } => 409,
            InventoryError::NoActiveBorrow { .. } => 409,
            InventoryError::ConcurrencyConflict { .. } => 409,
            InventoryError::StorageFailure(_) => 500,
            InventoryError::UploadFailure(_) => 502,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            InventoryError::NotFound(_) => "NOT_FOUND",
            InventoryError::Unavailable(_) => "UNAVAILABLE",
            InventoryError::AlreadyBorrowed { .. } => "ALREADY_BORROWED",
            InventoryError::NoActiveBorrow { .. } => "NO_ACTIVE_BORROW",
            InventoryError::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            InventoryError::StorageFailure(_) => "STORAGE_FAILURE",
            InventoryError::UploadFailure(_) => "UPLOAD_FAILURE",
        }
    }

    /// Whether the failure is internal rather than caused by the request
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            InventoryError::StorageFailure(_) | InventoryError::UploadFailure(_)
        )
    }

    /// Whether the store can no longer accept writes
    pub fn is_fatal(&self) -> bool {
        matches!(self, InventoryError::StorageFailure(e) if e.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(InventoryError::invalid("price", "negative").status_code(), 400);
        assert_eq!(InventoryError::NotFound("b".into()).status_code(), 404);
        assert_eq!(InventoryError::Unavailable("b".into()).status_code(), 409);
        assert_eq!(
            InventoryError::StorageFailure(RecordStoreError::IoError("disk".into())).status_code(),
            500
        );
        assert_eq!(
            InventoryError::UploadFailure(CoverError::IoError("disk".into())).status_code(),
            502
        );
    }

    #[test]
    fn test_rule_violations_keep_their_kind() {
        let err = InventoryError::from_rule(
            "b1",
            RuleViolation::AlreadyBorrowed {
                user_id: "u".into(),
            },
        );
        assert!(matches!(
            err,
            InventoryError::AlreadyBorrowed { ref book_id, ref user_id }
                if book_id == "b1" && user_id == "u"
        ));
        assert!(matches!(
            InventoryError::from_rule("b1", RuleViolation::Unavailable),
            InventoryError::Unavailable(_)
        ));
    }

    #[test]
    fn test_store_not_found_becomes_not_found() {
        let err = InventoryError::from_store("b1", RecordStoreError::NotFound("b1".into()));
        assert!(matches!(err, InventoryError::NotFound(ref id) if id == "b1"));

        let err = InventoryError::from_store("b1", RecordStoreError::IoError("x".into()));
        assert!(err.is_internal());
    }

    #[test]
    fn test_cover_rejection_is_invalid_argument() {
        let err = InventoryError::from_cover(CoverError::EmptyPayload);
        assert_eq!(err.code(), "INVALID_ARGUMENT");

        let err = InventoryError::from_cover(CoverError::IoError("x".into()));
        assert_eq!(err.code(), "UPLOAD_FAILURE");
    }

    #[test]
    fn test_only_fatal_store_errors_are_fatal() {
        let poisoned = InventoryError::from_store("b", RecordStoreError::Poisoned("EIO".into()));
        assert!(poisoned.is_fatal());
        assert!(poisoned.is_internal());
        let io = InventoryError::StorageFailure(RecordStoreError::IoError("disk".into()));
        assert!(!io.is_fatal());
        assert!(!InventoryError::NotFound("b".into()).is_fatal());
    }
}
