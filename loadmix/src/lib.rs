//! A load generator that drives a randomized mix of operations against a data store.
//!
//! A run consists of many concurrently simulated clients. Each [`Simulator`] owns a session to
//! the store and endlessly picks a random record number below the shared [`IdCounter`], then
//! reads it, deletes it, updates it (currently a no-op) or inserts a fresh record, according to
//! the configured [`Workload`]. All clients contribute to one set of lock-free [`Stats`].
//!
//! The [`Controller`] spawns the clients and waits for shutdown, usually SIGINT or SIGTERM. It then
//! turns the final statistics into a [`Report`]:
//!
//! - the fraction of operations that were inserts,
//! - the fraction of reads that found nothing,
//! - the total number of documents read and written.
//!
//! Any store failure aborts the whole run.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod counter;
pub mod observability;
pub mod report;
pub mod simulator;
pub mod stats;
pub mod workload;

pub use crate::controller::Controller;
pub use crate::counter::IdCounter;
pub use crate::report::Report;
pub use crate::simulator::Simulator;
pub use crate::stats::Stats;
pub use crate::workload::Workload;
