//! Orchestrates the simulated clients of a run.

use std::future::Future;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result};
use loadmix_store::BoxedStore;
use tokio::task::JoinSet;

use crate::config::Validated;
use crate::counter::IdCounter;
use crate::report::Report;
use crate::simulator::Simulator;
use crate::stats::Stats;
use crate::workload::Workload;

/// Runs a fixed number of simulated clients until shutdown is requested.
#[derive(Debug)]
pub struct Controller {
    clients: usize,
    workload: Workload,
    counter: Arc<IdCounter>,
    stats: Arc<Stats>,
    seed: u64,
}

impl Controller {
    /// Creates a controller for `clients` simulated clients.
    pub fn new(clients: usize, workload: Workload, start_id: NonZeroU64) -> Self {
        Self {
            clients,
            workload,
            counter: Arc::new(IdCounter::new(start_id)),
            stats: Arc::new(Stats::new()),
            seed: rand::random(),
        }
    }

    /// Creates a controller from validated configuration.
    pub fn from_config(config: &Validated) -> Self {
        Self::new(config.clients, config.workload, config.start_id)
    }

    /// Sets the base seed. Client `i` is seeded with `seed + i`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The id counter shared by all clients.
    pub fn counter(&self) -> &IdCounter {
        &self.counter
    }

    /// The statistics shared by all clients.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Spawns all clients and waits until `shutdown` resolves.
    ///
    /// Returns the report computed from the statistics at the time of shutdown. If any client
    /// fails, the run is aborted and the failure is returned instead. Clients are not drained
    /// either way: they are aborted when this function returns.
    pub async fn run<F>(&self, store: BoxedStore, shutdown: F) -> Result<Report>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            clients = self.clients,
            store = store.name(),
            start_id = self.counter.next(),
            "starting simulated clients"
        );

        let mut clients = JoinSet::new();
        for group in 0..self.clients as u64 {
            tracing::debug!(group, "spawning simulated client");
            let simulator = Simulator::new(
                group,
                self.workload,
                Arc::clone(&self.counter),
                Arc::clone(&self.stats),
                self.seed.wrapping_add(group),
            );
            clients.spawn(simulator.run(Arc::clone(&store)));
        }

        tokio::select! {
            () = shutdown => {
                tracing::info!("shutdown requested");
            }
            Some(joined) = clients.join_next() => {
                let Err(error) = joined.context("simulated client panicked")?;
                return Err(error).context("simulated client failed");
            }
        }

        clients.abort_all();
        Ok(Report::from(self.stats.snapshot()))
    }
}
