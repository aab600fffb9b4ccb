//! # Record Store Trait

use super::errors::RecordStoreResult;
use super::record::{Attributes, Record};

/// Key-value persistence keyed by a single primary identifier
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Fetch a record, `NotFound` if the key does not resolve
    fn get(&self, id: &str) -> RecordStoreResult<Record>;

    /// Write a full record image, replacing any previous one
    fn put(&self, id: &str, attributes: Attributes) -> RecordStoreResult<Record>;

    /// Overwrite a subset of attributes on an existing record.
    ///
    /// When `expected_version` is set the write is rejected with
    /// `VersionMismatch` unless the stored version still matches.
    fn update_fields(
        &self,
        id: &str,
        changes: Attributes,
        expected_version: Option<u64>,
    ) -> RecordStoreResult<Record>;

    /// Remove a record and return its last image; `NotFound` if it did
    /// not exist. Existence check and removal are one atomic step.
    fn delete(&self, id: &str) -> RecordStoreResult<Record>;

    /// Every stored record, in no particular order
    fn scan_all(&self) -> RecordStoreResult<Vec<Record>>;
}
