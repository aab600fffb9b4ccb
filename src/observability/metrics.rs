//! Inventory counters
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for the inventory service
#[derive(Debug, Default)]
pub struct InventoryMetrics {
    books_created: AtomicU64,
    books_updated: AtomicU64,
    books_deleted: AtomicU64,
    borrows: AtomicU64,
    returns: AtomicU64,
    conflicts_retried: AtomicU64,
    conflicts_exhausted: AtomicU64,
    operations_rejected: AtomicU64,
    storage_failures: AtomicU64,
}

impl InventoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_books_created(&self) {
        self.books_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_books_updated(&self) {
        self.books_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_books_deleted(&self) {
        self.books_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_borrows(&self) {
        self.borrows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_returns(&self) {
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts_retried(&self) {
        self.conflicts_retried.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_conflicts_exhausted(&self) {
        self.conflicts_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_operations_rejected(&self) {
        self.operations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_storage_failures(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            books_created: self.books_created.load(Ordering::Relaxed),
            books_updated: self.books_updated.load(Ordering::Relaxed),
            books_deleted: self.books_deleted.load(Ordering::Relaxed),
            borrows: self.borrows.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            conflicts_retried: self.conflicts_retried.load(Ordering::Relaxed),
            conflicts_exhausted: self.conflicts_exhausted.load(Ordering::Relaxed),
            operations_rejected: self.operations_rejected.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub books_created: u64,
    pub books_updated: u64,
    pub books_deleted: u64,
    pub borrows: u64,
    pub returns: u64,
    pub conflicts_retried: u64,
    pub conflicts_exhausted: u64,
    pub operations_rejected: u64,
    pub storage_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let snapshot = InventoryMetrics::new().snapshot();
        assert_eq!(snapshot.books_created, 0);
        assert_eq!(snapshot.borrows, 0);
        assert_eq!(snapshot.conflicts_retried, 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let metrics = InventoryMetrics::new();
        metrics.increment_borrows();
        metrics.increment_borrows();
        metrics.increment_returns();

        let value = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(value["borrows"], 2);
        assert_eq!(value["returns"], 1);
        assert_eq!(value["books_deleted"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(InventoryMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.increment_conflicts_retried();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().conflicts_retried, 800);
    }
}
