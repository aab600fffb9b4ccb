//! Observable events
//!
//! Every log line carries one of these as its `event` key.

use std::fmt;

/// Observable events in libris
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    ConfigLoaded,
    StoreOpened,
    Serving,
    ShutdownComplete,

    // Catalog writes
    BookCreated,
    BookUpdated,
    BookDeleted,
    CoverReplaced,

    // Lending
    BorrowStarted,
    BorrowCompleted,

    // Versioned writes
    VersionedWrite,
    /// A versioned write lost a race and is being retried
    ConflictRetry,
    ConflictExhausted,

    /// A caller request failed validation or a precondition
    OperationRejected,
    /// Store or blob backend failure
    StorageFailure,
    /// Best-effort cover removal did not succeed
    CoverCleanupFailed,

    // Audit
    AuditComplete,
    AuditFinding,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::Serving => "LIBRIS_SERVING",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::BookCreated => "BOOK_CREATED",
            Event::BookUpdated => "BOOK_UPDATED",
            Event::BookDeleted => "BOOK_DELETED",
            Event::CoverReplaced => "COVER_REPLACED",

            Event::BorrowStarted => "BORROW_STARTED",
            Event::BorrowCompleted => "BORROW_COMPLETED",
            Event::VersionedWrite => "VERSIONED_WRITE",
            Event::ConflictRetry => "CONFLICT_RETRY",
            Event::ConflictExhausted => "CONFLICT_EXHAUSTED",

            Event::OperationRejected => "OPERATION_REJECTED",
            Event::StorageFailure => "STORAGE_FAILURE",
            Event::CoverCleanupFailed => "COVER_CLEANUP_FAILED",

            Event::AuditComplete => "AUDIT_COMPLETE",
            Event::AuditFinding => "AUDIT_FINDING",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::StoreOpened,
            Event::Serving,
            Event::ShutdownComplete,
            Event::BookCreated,
            Event::BookUpdated,
            Event::BookDeleted,
            Event::CoverReplaced,
            Event::BorrowStarted,
            Event::BorrowCompleted,
            Event::VersionedWrite,
            Event::ConflictRetry,
            Event::ConflictExhausted,
            Event::OperationRejected,
            Event::StorageFailure,
            Event::CoverCleanupFailed,
            Event::AuditComplete,
            Event::AuditFinding,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_display() {
        assert_eq!(Event::BorrowStarted.to_string(), "BORROW_STARTED");
    }
}
