//! Data store clients driven by the `loadmix` load generator.
//!
//! The load generator only ever talks to a store through the narrow [`Store`] and [`Session`]
//! traits defined here. Every simulated client opens its own [`Session`] via [`Store::connect`]
//! and uses it exclusively, so implementations never need to share a session across tasks.
//!
//! Two backends are provided:
//!
//! - [`MongoStore`] talks to a MongoDB deployment through the official driver.
//! - [`MemoryStore`] keeps records in process. It is used for dry runs and throughout the test
//!   suites, and supports injecting failures into each operation.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::fmt::Debug;
use std::sync::Arc;

mod error;
mod memory;
mod mongo;
mod record;

pub use error::{BoxError, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use record::{GROUP_FIELD, NUMBER_FIELD, Record};

/// A shared, type-erased [`Store`] instance.
pub type BoxedStore = Arc<dyn Store>;

/// A type-erased [`Session`] owned by a single simulated client.
pub type BoxedSession = Box<dyn Session>;

/// A data store that hands out independent sessions.
#[async_trait::async_trait]
pub trait Store: Debug + Send + Sync + 'static {
    /// The store name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Opens a new logical connection to the store.
    ///
    /// Fails with [`StoreError::Connection`] if the store cannot be reached.
    async fn connect(&self) -> StoreResult<BoxedSession>;
}

/// A logical connection to a [`Store`].
#[async_trait::async_trait]
pub trait Session: Debug + Send + Sync {
    /// Inserts a new record.
    async fn insert(&self, record: &Record) -> StoreResult<()>;

    /// Counts records whose `field` equals `value`, counting at most `limit` of them.
    async fn count_matching(&self, field: &str, value: u64, limit: u64) -> StoreResult<u64>;

    /// Removes a single record whose `field` equals `value`.
    ///
    /// Returns `true` if a record was removed.
    async fn delete_one(&self, field: &str, value: u64) -> StoreResult<bool>;

    /// Releases the connection.
    async fn close(&self);
}
