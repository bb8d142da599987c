//! A single simulated client.

use std::convert::Infallible;
use std::sync::Arc;

use loadmix_store::{NUMBER_FIELD, Record, Session, Store, StoreResult};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::counter::IdCounter;
use crate::stats::Stats;
use crate::workload::{Operation, Workload};

/// Drives an endless sequence of randomized operations against a store.
///
/// Each simulator belongs to one `group`, which is stamped onto every record it inserts. The id
/// counter and statistics are shared with all other simulators of a run, while the store session
/// is owned exclusively.
#[derive(Debug)]
pub struct Simulator {
    group: u64,
    workload: Workload,
    counter: Arc<IdCounter>,
    stats: Arc<Stats>,
    rng: SmallRng,
}

impl Simulator {
    /// Creates a simulator whose random choices are derived from `seed`.
    pub fn new(
        group: u64,
        workload: Workload,
        counter: Arc<IdCounter>,
        stats: Arc<Stats>,
        seed: u64,
    ) -> Self {
        Self {
            group,
            workload,
            counter,
            stats,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Connects to the store and performs operations until one of them fails.
    ///
    /// This never returns successfully. On failure the session is closed before the error is
    /// returned.
    pub async fn run(mut self, store: Arc<dyn Store>) -> StoreResult<Infallible> {
        let session = store.connect().await?;
        tracing::trace!(group = self.group, "session established");

        let error = loop {
            if let Err(error) = self.step(session.as_ref()).await {
                break error;
            }
            tokio::task::yield_now().await;
        };

        tracing::error!(
            group = self.group,
            error = &error as &dyn std::error::Error,
            "simulated client failed"
        );
        session.close().await;
        Err(error)
    }

    /// Picks a random target number and operation, then performs it.
    pub async fn step(&mut self, session: &dyn Session) -> StoreResult<Operation> {
        let target = self.rng.random_range(0..self.counter.next());
        let operation = self.workload.choose(&mut self.rng);
        self.perform(operation, target, session).await?;
        Ok(operation)
    }

    /// Performs `operation` against the record numbered `target`.
    ///
    /// Inserts ignore `target` and allocate a new number instead.
    pub async fn perform(
        &self,
        operation: Operation,
        target: u64,
        session: &dyn Session,
    ) -> StoreResult<()> {
        match operation {
            Operation::Read => {
                self.read(target, session).await?;
            }
            Operation::Delete => {
                if self.read(target, session).await? > 0 {
                    session.delete_one(NUMBER_FIELD, target).await?;
                }
            }
            Operation::Update => {
                tracing::trace!(group = self.group, target, "update skipped");
            }
            Operation::Insert => {
                let record = Record {
                    number: self.counter.advance(),
                    group: self.group,
                };
                session.insert(&record).await?;
                self.stats.record_write();
            }
        }

        Ok(())
    }

    async fn read(&self, target: u64, session: &dyn Session) -> StoreResult<u64> {
        let count = session.count_matching(NUMBER_FIELD, target, 1).await?;
        self.stats.record_read(count);

        if count == 0 {
            tracing::trace!(group = self.group, target, "empty read");
        } else {
            tracing::trace!(group = self.group, target, count, "read");
        }

        Ok(count)
    }
}
