//! # Record Store Module
//!
//! Key-value persistence for catalog records, keyed by a single primary
//! identifier.
//!
//! # Design Principles
//!
//! - Sparse updates touch only the named attributes
//! - Every write bumps the record version
//! - Conditional writes reject stale versions
//! - Delete requires the record to exist

pub mod backend;
pub mod errors;
pub mod frame;
pub mod journal;
pub mod memory;
pub mod record;

pub use backend::RecordStore;
pub use errors::{RecordStoreError, RecordStoreResult};
pub use journal::JournalRecordStore;
pub use memory::MemoryRecordStore;
pub use record::{Attributes, Record, ID_ATTRIBUTE};
