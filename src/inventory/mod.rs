//! # Inventory Module
//!
//! The inventory consistency engine. Every caller-facing catalog and
//! lending operation goes through [`InventoryService`].
//!
//! # Guarantees
//!
//! - Invalid input is rejected before any store access
//! - Updates write only the attributes that changed
//! - Borrow and return never lose a concurrent write
//! - A failed create leaves no orphaned cover behind

pub mod codec;
pub mod errors;
pub mod service;
pub mod view;

pub use errors::{InventoryError, InventoryResult};
pub use service::{AuditReport, CoverUpload, DuplicateBorrow, InventoryConfig, InventoryService};
pub use view::{BookListing, BookView, Borrower};
