/// Name of the field holding a record's unique identifier.
pub const NUMBER_FIELD: &str = "number";

/// Name of the field holding the simulated client that created a record.
pub const GROUP_FIELD: &str = "group";

/// The unit of data written to and read from a store.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Record {
    /// Unique identifier, allocated from the shared id counter.
    pub number: u64,
    /// The simulated client that inserted this record.
    pub group: u64,
}

impl Record {
    /// Returns the value of the named field, or `None` for unknown fields.
    pub fn field(&self, name: &str) -> Option<u64> {
        match name {
            NUMBER_FIELD => Some(self.number),
            GROUP_FIELD => Some(self.group),
            _ => None,
        }
    }
}
