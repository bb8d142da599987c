//! The id counter shared by all simulated clients.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of record numbers.
///
/// The counter is the exclusive upper bound of all record numbers that may exist in the store.
/// Reads pick their target in `[0, next())`, and inserts allocate a fresh number with
/// [`advance`](Self::advance). It starts at a non-zero value so that the read range is never
/// empty, and it only ever grows.
#[derive(Debug)]
pub struct IdCounter {
    next: AtomicU64,
}

impl IdCounter {
    /// Creates a counter starting at `start`.
    pub fn new(start: NonZeroU64) -> Self {
        Self {
            next: AtomicU64::new(start.get()),
        }
    }

    /// Returns the current exclusive upper bound of allocated numbers.
    pub fn next(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }

    /// Allocates a new number, returning it.
    ///
    /// The returned number is unique across all callers.
    pub fn advance(&self) -> u64 {
        self.next.fetch_add(1, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn counter(start: u64) -> IdCounter {
        IdCounter::new(NonZeroU64::new(start).unwrap())
    }

    #[test]
    fn next_is_idempotent() {
        let counter = counter(1000);
        assert_eq!(counter.next(), 1000);
        assert_eq!(counter.next(), 1000);
    }

    #[test]
    fn advance_returns_previous_value() {
        let counter = counter(1000);

        assert_eq!(counter.advance(), 1000);
        assert_eq!(counter.advance(), 1001);
        assert_eq!(counter.next(), 1002);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_advances_are_not_lost() {
        const TASKS: u64 = 16;
        const ADVANCES: u64 = 1000;

        let counter = Arc::new(counter(1000));
        let tasks: Vec<_> = (0..TASKS)
            .map(|_| {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let mut ids = Vec::with_capacity(ADVANCES as usize);
                    for _ in 0..ADVANCES {
                        ids.push(counter.advance());
                        tokio::task::yield_now().await;
                    }
                    ids
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for task in tasks {
            for id in task.await.unwrap() {
                assert!(id >= 1000);
                assert!(seen.insert(id), "id {id} allocated twice");
            }
        }

        assert_eq!(seen.len() as u64, TASKS * ADVANCES);
        assert_eq!(counter.next(), 1000 + TASKS * ADVANCES);
    }

    #[test]
    fn never_decreases_under_contention() {
        let counter = counter(1);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        counter.advance();
                    }
                });
            }

            scope.spawn(|| {
                let mut last = counter.next();
                for _ in 0..1000 {
                    let current = counter.next();
                    assert!(current >= last);
                    assert!(current > 0);
                    last = current;
                }
            });
        });

        assert_eq!(counter.next(), 4001);
    }
}
