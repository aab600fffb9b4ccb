//! # Inventory Service
//!
//! Composes the record store, the cover asset manager and the catalog
//! rules. Every mutation reads the current record, runs a pure rule on it
//! and writes back only what changed.
//!
//! Updates, cover replacements, borrows and returns are conditioned on the
//! version they read. A lost race re-runs the whole read-modify-write, up
//! to `max_conflict_retries` times.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::codec::{book_from_record, book_to_attributes, changed_attributes, lending_attributes};
use super::errors::{InventoryError, InventoryResult};
use super::view::{BookListing, BookView};
use crate::catalog::{
    self, apply_partial_update, complete_borrow, duplicate_active_borrows, start_borrow, Book,
    BookId, BookPatch, NewBook, RuleResult,
};
use crate::cover_assets::{CoverAssetManager, CoverError};
use crate::observability::{Event, InventoryMetrics, Logger};
use crate::record_store::{Attributes, Record, RecordStore, RecordStoreError};

/// Tunables for the inventory service
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Time between borrow and expected return
    pub loan_period: Duration,
    /// Extra attempts after a version conflict
    pub max_conflict_retries: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            loan_period: Duration::days(14),
            max_conflict_retries: 3,
        }
    }
}

/// A cover image supplied by a caller
#[derive(Debug, Clone)]
pub struct CoverUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl CoverUpload {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }
}

/// A user holding more than one active borrow of the same book
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateBorrow {
    pub book_id: String,
    pub user_id: String,
    pub active: usize,
}

/// Result of a full consistency scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub records_scanned: usize,
    /// Keys of records that do not decode as books
    pub undecodable: Vec<String>,
    pub duplicate_borrows: Vec<DuplicateBorrow>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.undecodable.is_empty() && self.duplicate_borrows.is_empty()
    }
}

/// Catalog and lending operations
#[derive(Debug)]
pub struct InventoryService {
    store: Arc<dyn RecordStore>,
    covers: CoverAssetManager,
    config: InventoryConfig,
    metrics: Arc<InventoryMetrics>,
}

impl InventoryService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        covers: CoverAssetManager,
        config: InventoryConfig,
    ) -> Self {
        Self {
            store,
            covers,
            config,
            metrics: Arc::new(InventoryMetrics::new()),
        }
    }

    pub fn covers(&self) -> &CoverAssetManager {
        &self.covers
    }

    pub fn metrics(&self) -> &InventoryMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    // ==================
    // Catalog operations
    // ==================

    /// Create a book with its cover
    pub fn create(&self, input: &NewBook, cover: Option<CoverUpload>) -> InventoryResult<Book> {
        let id = BookId::new();
        let result = self.create_inner(id, input, cover);
        self.observe("create", &id.to_string(), result)
    }

    fn create_inner(
        &self,
        id: BookId,
        input: &NewBook,
        cover: Option<CoverUpload>,
    ) -> InventoryResult<Book> {
        let cover = require_cover(cover)?;
        let key_id = id.to_string();
        let now = Utc::now();

        // Validate before anything is uploaded.
        let mut book = catalog::new_book(input, id, None, now)
            .map_err(|v| InventoryError::from_rule(&key_id, v))?;

        let key = self.covers.key_for(&key_id, &cover.bytes, &cover.content_type);
        let url = self
            .covers
            .upload(&cover.bytes, &cover.content_type, &key)
            .map_err(InventoryError::from_cover)?;
        book.cover_url = Some(url);

        let written = book_to_attributes(&book).and_then(|attrs| self.store.put(&key_id, attrs));
        if let Err(e) = written {
            self.discard_cover(&key_id, &key);
            return Err(InventoryError::StorageFailure(e));
        }

        self.metrics.increment_books_created();
        Logger::info(
            Event::BookCreated.as_str(),
            &[("book_id", key_id.as_str()), ("title", book.title.as_str())],
        );
        Ok(book)
    }

    /// Apply a sparse change to the mutable fields of a book
    pub fn update(&self, id: &str, patch: &BookPatch) -> InventoryResult<Book> {
        let result = self.update_inner(id, patch);
        self.observe("update", id, result)
    }

    fn update_inner(&self, id: &str, patch: &BookPatch) -> InventoryResult<Book> {
        catalog::validate_mutable_fields(patch).map_err(|v| InventoryError::from_rule(id, v))?;

        let (_, stored) = self.modify(id, |book, now| {
            let next = apply_partial_update(book, patch, now)
                .map_err(|v| InventoryError::from_rule(id, v))?;
            changed_attributes(book, &next).map_err(InventoryError::StorageFailure)
        })?;
        self.metrics.increment_books_updated();
        Logger::info(Event::BookUpdated.as_str(), &[("book_id", id)]);
        Ok(stored)
    }

    /// Replace the cover of a book
    pub fn update_cover(&self, id: &str, cover: Option<CoverUpload>) -> InventoryResult<Book> {
        let result = self.update_cover_inner(id, cover);
        self.observe("update_cover", id, result)
    }

    fn update_cover_inner(&self, id: &str, cover: Option<CoverUpload>) -> InventoryResult<Book> {
        let cover = require_cover(cover)?;
        // Nothing is uploaded for a missing book.
        self.load(id)?;

        let key = self.covers.key_for(id, &cover.bytes, &cover.content_type);
        let url = self
            .covers
            .upload(&cover.bytes, &cover.content_type, &key)
            .map_err(InventoryError::from_cover)?;

        let result = self.modify(id, |book, now| {
            let mut next = book.clone();
            next.cover_url = Some(url.clone());
            next.touch(now);
            changed_attributes(book, &next).map_err(InventoryError::StorageFailure)
        });
        let (replaced, stored) = match result {
            Ok(pair) => pair,
            Err(e) => {
                let still_used = self
                    .load(id)
                    .ok()
                    .and_then(|(_, book)| self.cover_key(&book))
                    .is_some_and(|current| current == key);
                if !still_used {
                    self.discard_cover(id, &key);
                }
                return Err(e);
            }
        };

        // Only the cover this write actually replaced is ours to remove.
        if let Some(old) = self.cover_key(&replaced).filter(|old| *old != key) {
            self.discard_cover(id, &old);
        }
        self.metrics.increment_books_updated();
        Logger::info(
            Event::CoverReplaced.as_str(),
            &[("book_id", id), ("key", key.as_str())],
        );
        Ok(stored)
    }

    /// Remove a book; its cover is removed best-effort afterwards
    pub fn delete(&self, id: &str) -> InventoryResult<()> {
        let result = self.delete_inner(id);
        self.observe("delete", id, result)
    }

    fn delete_inner(&self, id: &str) -> InventoryResult<()> {
        let removed = self
            .store
            .delete(id)
            .map_err(|e| InventoryError::from_store(id, e))?;

        if let Some(key) = removed
            .attribute("coverUrl")
            .and_then(|v| v.as_str())
            .and_then(|url| self.covers.key_from_url(url))
        {
            self.discard_cover(id, &key);
        }

        self.metrics.increment_books_deleted();
        Logger::info(Event::BookDeleted.as_str(), &[("book_id", id)]);
        Ok(())
    }

    /// Fetch one book
    pub fn get_by_id(&self, id: &str) -> InventoryResult<Book> {
        let result = self.load(id).map(|(_, book)| book);
        self.observe("get", id, result)
    }

    /// Every decodable book, oldest first
    pub fn list_all(&self) -> InventoryResult<BookListing> {
        let result = self.list_inner();
        self.observe("list", "*", result)
    }

    fn list_inner(&self) -> InventoryResult<BookListing> {
        let records = self
            .store
            .scan_all()
            .map_err(InventoryError::StorageFailure)?;

        let mut books: Vec<Book> = Vec::with_capacity(records.len());
        for record in &records {
            match book_from_record(record) {
                Ok(book) => books.push(book),
                Err(e) => Logger::warn(
                    Event::AuditFinding.as_str(),
                    &[("book_id", record.id.as_str()), ("reason", e.to_string().as_str())],
                ),
            }
        }
        books.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });

        Ok(BookListing::new(books.iter().map(BookView::from).collect()))
    }

    // ==================
    // Lending operations
    // ==================

    /// Lend one copy of a book to a user
    pub fn borrow(&self, id: &str, user_id: &str) -> InventoryResult<Book> {
        let loan_period = self.config.loan_period;
        let result = self.lend(id, |book, now| start_borrow(book, user_id, now, loan_period));
        if result.is_ok() {
            self.metrics.increment_borrows();
            Logger::info(
                Event::BorrowStarted.as_str(),
                &[("book_id", id), ("user_id", user_id)],
            );
        }
        self.observe("borrow", id, result)
    }

    /// Take back the copy a user holds
    pub fn return_item(&self, id: &str, user_id: &str) -> InventoryResult<Book> {
        let result = self.lend(id, |book, now| complete_borrow(book, user_id, now));
        if result.is_ok() {
            self.metrics.increment_returns();
            Logger::info(
                Event::BorrowCompleted.as_str(),
                &[("book_id", id), ("user_id", user_id)],
            );
        }
        self.observe("return", id, result)
    }

    /// Apply a lending rule and write the lending attributes back
    fn lend<F>(&self, id: &str, rule: F) -> InventoryResult<Book>
    where
        F: Fn(&Book, DateTime<Utc>) -> RuleResult<Book>,
    {
        self.modify(id, |book, now| {
            let next = rule(book, now).map_err(|v| InventoryError::from_rule(id, v))?;
            lending_attributes(&next).map_err(InventoryError::StorageFailure)
        })
        .map(|(_, stored)| stored)
    }

    /// Versioned read-modify-write with bounded retry.
    ///
    /// `change` computes the attributes to write from the book as read.
    /// Returns the book it replaced and the book as stored.
    fn modify<F>(&self, id: &str, change: F) -> InventoryResult<(Book, Book)>
    where
        F: Fn(&Book, DateTime<Utc>) -> InventoryResult<Attributes>,
    {
        let attempts = self.config.max_conflict_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let (record, book) = self.load(id)?;
            let changes = change(&book, Utc::now())?;

            match self.store.update_fields(id, changes, Some(record.version)) {
                Ok(stored) => {
                    Logger::trace(
                        Event::VersionedWrite.as_str(),
                        &[
                            ("attempt", attempt.to_string().as_str()),
                            ("book_id", id),
                            ("version", stored.version.to_string().as_str()),
                        ],
                    );
                    return Ok((book, decode(&stored)?));
                }
                Err(RecordStoreError::VersionMismatch { expected, actual, .. }) => {
                    if attempt < attempts {
                        self.metrics.increment_conflicts_retried();
                        Logger::warn(
                            Event::ConflictRetry.as_str(),
                            &[
                                ("actual", actual.to_string().as_str()),
                                ("attempt", attempt.to_string().as_str()),
                                ("book_id", id),
                                ("expected", expected.to_string().as_str()),
                            ],
                        );
                    }
                }
                Err(e) => return Err(InventoryError::from_store(id, e)),
            }
        }

        self.metrics.increment_conflicts_exhausted();
        Logger::error(
            Event::ConflictExhausted.as_str(),
            &[("attempts", attempts.to_string().as_str()), ("book_id", id)],
        );
        Err(InventoryError::ConcurrencyConflict {
            book_id: id.to_string(),
            attempts,
        })
    }

    // =====
    // Audit
    // =====

    /// Scan every record for broken invariants
    pub fn audit(&self) -> InventoryResult<AuditReport> {
        let records = self
            .store
            .scan_all()
            .map_err(InventoryError::StorageFailure)?;

        let mut report = AuditReport {
            records_scanned: records.len(),
            ..Default::default()
        };

        for record in &records {
            let book = match book_from_record(record) {
                Ok(book) => book,
                Err(e) => {
                    Logger::warn(
                        Event::AuditFinding.as_str(),
                        &[("book_id", record.id.as_str()), ("reason", e.to_string().as_str())],
                    );
                    report.undecodable.push(record.id.clone());
                    continue;
                }
            };
            for (user_id, active) in duplicate_active_borrows(&book) {
                Logger::warn(
                    Event::AuditFinding.as_str(),
                    &[
                        ("active", active.to_string().as_str()),
                        ("book_id", record.id.as_str()),
                        ("reason", "duplicate active borrows"),
                        ("user_id", user_id.as_str()),
                    ],
                );
                report.duplicate_borrows.push(DuplicateBorrow {
                    book_id: record.id.clone(),
                    user_id,
                    active,
                });
            }
        }

        report.undecodable.sort();
        report
            .duplicate_borrows
            .sort_by(|a, b| (&a.book_id, &a.user_id).cmp(&(&b.book_id, &b.user_id)));

        Logger::info(
            Event::AuditComplete.as_str(),
            &[
                ("duplicate_borrows", report.duplicate_borrows.len().to_string().as_str()),
                ("records_scanned", report.records_scanned.to_string().as_str()),
                ("undecodable", report.undecodable.len().to_string().as_str()),
            ],
        );
        Ok(report)
    }

    // =======
    // Helpers
    // =======

    fn load(&self, id: &str) -> InventoryResult<(Record, Book)> {
        let record = self
            .store
            .get(id)
            .map_err(|e| InventoryError::from_store(id, e))?;
        let book = decode(&record)?;
        Ok((record, book))
    }

    fn cover_key(&self, book: &Book) -> Option<String> {
        book.cover_url
            .as_deref()
            .and_then(|url| self.covers.key_from_url(url))
    }

    /// Best-effort cover removal; failures are logged only
    fn discard_cover(&self, book_id: &str, key: &str) {
        match self.covers.delete(key) {
            Ok(()) | Err(CoverError::ObjectNotFound(_)) => {}
            Err(e) => Logger::warn(
                Event::CoverCleanupFailed.as_str(),
                &[("book_id", book_id), ("key", key), ("reason", e.to_string().as_str())],
            ),
        }
    }

    /// Count and log a failed operation
    fn observe<T>(
        &self,
        operation: &str,
        book_id: &str,
        result: InventoryResult<T>,
    ) -> InventoryResult<T> {
        if let Err(e) = &result {
            let message = e.to_string();
            let fields = [
                ("book_id", book_id),
                ("code", e.code()),
                ("operation", operation),
                ("reason", message.as_str()),
            ];
            if e.is_fatal() {
                self.metrics.increment_storage_failures();
                Logger::fatal(Event::StorageFailure.as_str(), &fields);
            } else if e.is_internal() {
                self.metrics.increment_storage_failures();
                Logger::error(Event::StorageFailure.as_str(), &fields);
            } else {
                self.metrics.increment_operations_rejected();
                Logger::warn(Event::OperationRejected.as_str(), &fields);
            }
        }
        result
    }
}

fn decode(record: &Record) -> InventoryResult<Book> {
    book_from_record(record).map_err(InventoryError::StorageFailure)
}

fn require_cover(cover: Option<CoverUpload>) -> InventoryResult<CoverUpload> {
    match cover {
        Some(c) if !c.bytes.is_empty() => Ok(c),
        Some(_) => Err(InventoryError::invalid("cover", "cover image is empty")),
        None => Err(InventoryError::invalid("cover", "cover image is required")),
    }
}
