//! MongoDB store.

use std::fmt;

use bson::{Document, doc};
use mongodb::{Client, Collection};

use crate::error::{StoreError, StoreResult};
use crate::record::{GROUP_FIELD, NUMBER_FIELD, Record};
use crate::{BoxedSession, Session, Store};

/// A [`Store`] backed by a MongoDB collection.
///
/// Every call to [`Store::connect`] creates a dedicated driver client, so simulated clients never
/// share a connection pool.
#[derive(Clone)]
pub struct MongoStore {
    uri: String,
    database: String,
    collection: String,
}

impl MongoStore {
    /// Creates a store for the given connection string, database and collection.
    ///
    /// No connection is made until [`Store::connect`] is called.
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
        }
    }
}

// The connection string may carry credentials.
impl fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoStore")
            .field("uri", &"[redacted]")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .finish()
    }
}

#[async_trait::async_trait]
impl Store for MongoStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn connect(&self) -> StoreResult<BoxedSession> {
        let client = Client::with_uri_str(&self.uri)
            .await
            .map_err(|e| StoreError::connection(self.name(), e))?;
        let database = client.database(&self.database);

        // The driver connects lazily, so ping to surface unreachable servers right away.
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::connection(self.name(), e))?;

        tracing::trace!(database = %self.database, collection = %self.collection, "connected");
        let collection = database.collection(&self.collection);
        Ok(Box::new(MongoSession { client, collection }))
    }
}

#[derive(Debug)]
struct MongoSession {
    client: Client,
    collection: Collection<Document>,
}

#[async_trait::async_trait]
impl Session for MongoSession {
    async fn insert(&self, record: &Record) -> StoreResult<()> {
        let document = record_to_document(record)?;
        self.collection
            .insert_one(document)
            .await
            .map_err(|e| StoreError::write(record.number, e))?;
        Ok(())
    }

    async fn count_matching(&self, field: &str, value: u64, limit: u64) -> StoreResult<u64> {
        let filter = filter(field, value).map_err(|e| StoreError::query(field, value, e))?;
        self.collection
            .count_documents(filter)
            .limit(limit)
            .await
            .map_err(|e| StoreError::query(field, value, e))
    }

    async fn delete_one(&self, field: &str, value: u64) -> StoreResult<bool> {
        let filter = filter(field, value).map_err(|e| StoreError::delete(field, value, e))?;
        let result = self
            .collection
            .delete_one(filter)
            .await
            .map_err(|e| StoreError::delete(field, value, e))?;
        Ok(result.deleted_count > 0)
    }

    async fn close(&self) {
        self.client.clone().shutdown().immediate(true).await;
    }
}

/// BSON has no unsigned 64-bit integer, so values are stored as `i64`.
fn to_bson_int(value: u64) -> Result<i64, std::num::TryFromIntError> {
    i64::try_from(value)
}

fn filter(field: &str, value: u64) -> Result<Document, std::num::TryFromIntError> {
    let mut filter = Document::new();
    filter.insert(field, to_bson_int(value)?);
    Ok(filter)
}

fn record_to_document(record: &Record) -> StoreResult<Document> {
    let number = to_bson_int(record.number).map_err(|e| StoreError::write(record.number, e))?;
    let group = to_bson_int(record.group).map_err(|e| StoreError::write(record.number, e))?;

    let mut document = Document::new();
    document.insert(NUMBER_FIELD, number);
    document.insert(GROUP_FIELD, group);
    Ok(document)
}
