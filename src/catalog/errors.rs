//! # Catalog Rule Errors

use thiserror::Error;

/// Result type for aggregate rules
pub type RuleResult<T> = Result<T, RuleViolation>;

/// A mutation the aggregate refuses to apply
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleViolation {
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("No copies available")]
    Unavailable,

    #[error("User {user_id} already has an active borrow")]
    AlreadyBorrowed { user_id: String },

    #[error("User {user_id} has no active borrow")]
    NoActiveBorrow { user_id: String },
}

impl RuleViolation {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}
