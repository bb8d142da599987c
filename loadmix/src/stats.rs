//! Lock-free statistics shared by all simulated clients.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters aggregated across all simulated clients.
///
/// Every counter is updated independently with atomic increments, so reading them never blocks
/// writers. A [`snapshot`](Self::snapshot) is therefore not transactional: it may observe a read
/// that has been counted in `total_reads` but not yet in `total_documents_read`.
#[derive(Debug, Default)]
pub struct Stats {
    empty_reads: AtomicU64,
    total_reads: AtomicU64,
    total_documents_read: AtomicU64,
    total_writes: AtomicU64,
}

impl Stats {
    /// Creates a new set of counters, all zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed read that matched `count` documents.
    pub fn record_read(&self, count: u64) {
        // `total_reads` goes first so that no snapshot sees more empty or documents read than
        // reads in total.
        self.total_reads.fetch_add(1, Ordering::SeqCst);
        if count == 0 {
            self.empty_reads.fetch_add(1, Ordering::SeqCst);
        }
        self.total_documents_read.fetch_add(count, Ordering::SeqCst);
    }

    /// Records a completed insert.
    pub fn record_write(&self) {
        self.total_writes.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns the current value of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        // Loaded in reverse order of `record_read`.
        let total_documents_read = self.total_documents_read.load(Ordering::SeqCst);
        let empty_reads = self.empty_reads.load(Ordering::SeqCst);
        let total_reads = self.total_reads.load(Ordering::SeqCst);
        let total_writes = self.total_writes.load(Ordering::SeqCst);

        StatsSnapshot {
            empty_reads,
            total_reads,
            total_documents_read,
            total_writes,
        }
    }
}

/// A point-in-time copy of [`Stats`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatsSnapshot {
    /// Reads that matched no document.
    pub empty_reads: u64,
    /// All completed reads, including the lookups performed by deletes.
    pub total_reads: u64,
    /// Documents matched by all reads.
    pub total_documents_read: u64,
    /// Completed inserts.
    pub total_writes: u64,
}
