//! In-process store for dry runs and tests.
//!
//! [`MemoryStore`] keeps records in a `HashMap` keyed by their number, which mirrors a unique
//! index on [`NUMBER_FIELD`]. The store is [`Clone`] so that tests can hold a handle for direct
//! inspection while the load generator owns another. Individual operations can be made to fail to
//! exercise the error paths of the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{StoreError, StoreResult};
use crate::record::{NUMBER_FIELD, Record};
use crate::{BoxedSession, Session, Store};

#[derive(Debug, Default)]
struct Inner {
    records: Mutex<HashMap<u64, Record>>,
    open_sessions: AtomicUsize,

    refuse_connections: AtomicBool,
    fail_queries: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Inner {
    fn records(&self) -> MutexGuard<'_, HashMap<u64, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`Store`] that keeps all records in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.inner.records().len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.records().is_empty()
    }

    /// Returns the record with the given number, if present.
    pub fn get(&self, number: u64) -> Option<Record> {
        self.inner.records().get(&number).copied()
    }

    /// Returns a copy of all stored records, in no particular order.
    pub fn records(&self) -> Vec<Record> {
        self.inner.records().values().copied().collect()
    }

    /// Returns the number of sessions that have been opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::Acquire)
    }

    /// Makes all subsequent calls to [`Store::connect`] fail.
    pub fn refuse_connections(&self) {
        self.inner.refuse_connections.store(true, Ordering::Release);
    }

    /// Makes all subsequent calls to [`Session::count_matching`] fail.
    pub fn fail_queries(&self) {
        self.inner.fail_queries.store(true, Ordering::Release);
    }

    /// Makes all subsequent calls to [`Session::insert`] fail.
    pub fn fail_writes(&self) {
        self.inner.fail_writes.store(true, Ordering::Release);
    }

    /// Makes all subsequent calls to [`Session::delete_one`] fail.
    pub fn fail_deletes(&self) {
        self.inner.fail_deletes.store(true, Ordering::Release);
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> StoreResult<BoxedSession> {
        if self.inner.refuse_connections.load(Ordering::Acquire) {
            return Err(StoreError::connection(self.name(), "connection refused"));
        }

        self.inner.open_sessions.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MemorySession {
            inner: Arc::clone(&self.inner),
            closed: AtomicBool::new(false),
        }))
    }
}

#[derive(Debug)]
struct MemorySession {
    inner: Arc<Inner>,
    closed: AtomicBool,
}

#[async_trait::async_trait]
impl Session for MemorySession {
    async fn insert(&self, record: &Record) -> StoreResult<()> {
        if self.inner.fail_writes.load(Ordering::Acquire) {
            return Err(StoreError::write(record.number, "writes are disabled"));
        }

        let mut records = self.inner.records();
        if records.contains_key(&record.number) {
            return Err(StoreError::write(record.number, "duplicate key"));
        }
        records.insert(record.number, *record);
        Ok(())
    }

    async fn count_matching(&self, field: &str, value: u64, limit: u64) -> StoreResult<u64> {
        if self.inner.fail_queries.load(Ordering::Acquire) {
            return Err(StoreError::query(field, value, "queries are disabled"));
        }

        let records = self.inner.records();
        let count = if field == NUMBER_FIELD {
            u64::from(records.contains_key(&value))
        } else {
            records
                .values()
                .filter(|record| record.field(field) == Some(value))
                .count() as u64
        };

        Ok(count.min(limit))
    }

    async fn delete_one(&self, field: &str, value: u64) -> StoreResult<bool> {
        if self.inner.fail_deletes.load(Ordering::Acquire) {
            return Err(StoreError::delete(field, value, "deletes are disabled"));
        }

        let mut records = self.inner.records();
        let number = if field == NUMBER_FIELD {
            records.contains_key(&value).then_some(value)
        } else {
            records
                .values()
                .find(|record| record.field(field) == Some(value))
                .map(|record| record.number)
        };

        Ok(number.and_then(|number| records.remove(&number)).is_some())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.inner.open_sessions.fetch_sub(1, Ordering::AcqRel);
        }
    }
}
