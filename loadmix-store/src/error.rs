use thiserror::Error;

/// A type-erased error raised by a store driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while talking to a store.
///
/// Every variant identifies the operation that failed. The load generator treats all of them as
/// fatal for the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A session to the store could not be established.
    #[error("failed to connect to {store} store")]
    Connection {
        /// Name of the store that refused the connection.
        store: &'static str,
        #[source]
        cause: BoxError,
    },

    /// Counting matching records failed.
    #[error("failed to count records where `{field}` is {value}")]
    Query {
        /// The field that was queried.
        field: String,
        /// The value that was queried.
        value: u64,
        #[source]
        cause: BoxError,
    },

    /// Inserting a record failed.
    #[error("failed to insert record {number}")]
    Write {
        /// The number of the record that could not be inserted.
        number: u64,
        #[source]
        cause: BoxError,
    },

    /// Removing a record failed.
    #[error("failed to delete record where `{field}` is {value}")]
    Delete {
        /// The field that was matched.
        field: String,
        /// The value that was matched.
        value: u64,
        #[source]
        cause: BoxError,
    },
}

impl StoreError {
    pub(crate) fn connection(store: &'static str, cause: impl Into<BoxError>) -> Self {
        Self::Connection {
            store,
            cause: cause.into(),
        }
    }

    pub(crate) fn query(field: &str, value: u64, cause: impl Into<BoxError>) -> Self {
        Self::Query {
            field: field.to_owned(),
            value,
            cause: cause.into(),
        }
    }

    pub(crate) fn write(number: u64, cause: impl Into<BoxError>) -> Self {
        Self::Write {
            number,
            cause: cause.into(),
        }
    }

    pub(crate) fn delete(field: &str, value: u64, cause: impl Into<BoxError>) -> Self {
        Self::Delete {
            field: field.to_owned(),
            value,
            cause: cause.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T, E = StoreError> = Result<T, E>;
