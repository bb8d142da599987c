//! Test utilities for the load generator and its stores.

pub mod tracing;
