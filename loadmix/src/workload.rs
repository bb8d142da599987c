//! The operation mix executed by every simulated client.

use rand::Rng;
use thiserror::Error;

/// Errors raised when building a [`Workload`] from invalid fractions.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum WorkloadError {
    /// A fraction lies outside of `[0, 1]` or is not a number.
    #[error("{name} must be between 0 and 1, got {value}")]
    OutOfRange {
        /// Name of the offending fraction.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Deletes and updates leave no room for inserts.
    #[error("delete fraction ({delete}) and update fraction ({update}) must sum to less than 1")]
    NoInserts {
        /// The configured delete fraction.
        delete: f64,
        /// The configured update fraction.
        update: f64,
    },
}

/// A builder for creating a [`Workload`].
#[derive(Debug)]
pub struct WorkloadBuilder {
    write_fraction: f64,
    delete_fraction: f64,
    update_fraction: f64,
}

impl WorkloadBuilder {
    /// The fraction of all operations that are writes.
    pub fn write_fraction(mut self, fraction: f64) -> Self {
        self.write_fraction = fraction;
        self
    }

    /// The fraction of writes that are deletes.
    pub fn delete_fraction(mut self, fraction: f64) -> Self {
        self.delete_fraction = fraction;
        self
    }

    /// The fraction of writes that are updates.
    pub fn update_fraction(mut self, fraction: f64) -> Self {
        self.update_fraction = fraction;
        self
    }

    /// Validates the fractions and creates the workload.
    ///
    /// All fractions must lie in `[0, 1]`, and deletes and updates together must leave a positive
    /// share of writes to inserts.
    pub fn build(self) -> Result<Workload, WorkloadError> {
        check_fraction("write fraction", self.write_fraction)?;
        check_fraction("delete fraction", self.delete_fraction)?;
        check_fraction("update fraction", self.update_fraction)?;

        if self.delete_fraction + self.update_fraction >= 1.0 {
            return Err(WorkloadError::NoInserts {
                delete: self.delete_fraction,
                update: self.update_fraction,
            });
        }

        Ok(Workload {
            write_fraction: self.write_fraction,
            delete_fraction: self.delete_fraction,
            update_fraction: self.update_fraction,
        })
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), WorkloadError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(WorkloadError::OutOfRange { name, value })
    }
}

/// A validated mix of reads, deletes, updates and inserts.
///
/// Each operation first decides between a read and a write. Writes are then split into deletes,
/// updates and inserts, where inserts receive the remainder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Workload {
    write_fraction: f64,
    delete_fraction: f64,
    update_fraction: f64,
}

impl Workload {
    /// Constructs a new workload builder with 60% writes, of which 10% are deletes and 10% are
    /// updates.
    pub fn builder() -> WorkloadBuilder {
        WorkloadBuilder {
            write_fraction: 0.6,
            delete_fraction: 0.1,
            update_fraction: 0.1,
        }
    }

    /// The fraction of all operations that are writes.
    pub fn write_fraction(&self) -> f64 {
        self.write_fraction
    }

    /// The fraction of writes that are deletes.
    pub fn delete_fraction(&self) -> f64 {
        self.delete_fraction
    }

    /// The fraction of writes that are updates.
    pub fn update_fraction(&self) -> f64 {
        self.update_fraction
    }

    /// Picks the next operation.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Operation {
        if rng.random::<f64>() > self.write_fraction {
            return Operation::Read;
        }

        let kind = rng.random::<f64>();
        if kind <= self.delete_fraction {
            Operation::Delete
        } else if kind <= self.delete_fraction + self.update_fraction {
            Operation::Update
        } else {
            Operation::Insert
        }
    }
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            write_fraction: 0.6,
            delete_fraction: 0.1,
            update_fraction: 0.1,
        }
    }
}

/// An operation performed by a simulated client.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// Count the records matching a random number.
    Read,
    /// Look up a random number and remove the matching record.
    Delete,
    /// Placeholder for modifying a record, currently does nothing.
    Update,
    /// Insert a record with a newly allocated number.
    Insert,
}
