//! The table contract.
//!
//! A table is a named storage target that owns its own schema and knows how
//! to turn one record into rows. Tables are shared across runs and across
//! concurrent workers, so implementations must be `Send + Sync`.

use crate::error::StorageError;
use crate::store::Store;

/// A named, schema-owning storage target for records of type `R`.
pub trait Table<R>: Send + Sync {
    /// Table name, used for schema lookup and timing statistics.
    fn name(&self) -> &str;

    /// SQL executed to create the table.
    fn schema(&self) -> String;

    /// Create the table if it does not exist yet.
    fn ensure_schema(&self, store: &Store) -> Result<(), StorageError> {
        store.create_table_if_necessary(self.name(), &self.schema())?;
        Ok(())
    }

    /// Write `record` as one or more rows.
    ///
    /// Transaction scoping, if any, is the table's responsibility.
    fn write_record(&self, store: &Store, record: &R) -> Result<(), StorageError>;
}
