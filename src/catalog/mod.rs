//! # Catalog Module
//!
//! The book aggregate: entity types, sparse patches, and the pure rules
//! every mutation goes through.
//!
//! # Invariants Enforced
//!
//! - Quantity never drops below zero
//! - At most one active borrow per user and book
//! - Only an active borrow can be returned, and only once
//! - Available plus lent copies is conserved across borrow/return
//! - `updated_at` never moves backwards

pub mod book;
pub mod errors;
pub mod patch;
pub mod rules;

pub use book::{Book, BookId, Borrow, BorrowStatus, Category, NewBook};
pub use errors::{RuleResult, RuleViolation};
pub use patch::{BookPatch, Patch};
pub use rules::{
    apply_partial_update, complete_borrow, duplicate_active_borrows, new_book, start_borrow,
    validate_mutable_fields,
};
