//! # Observability
//!
//! Structured JSON logging, typed events and atomic counters.
//!
//! # Usage
//!
//! ```ignore
//! use libris::observability::{Event, InventoryMetrics, Logger};
//!
//! Logger::info(Event::BorrowStarted.as_str(), &[("book_id", "b1")]);
//!
//! let metrics = InventoryMetrics::new();
//! metrics.increment_borrows();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{InventoryMetrics, MetricsSnapshot};
