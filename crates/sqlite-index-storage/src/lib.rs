//! Storage layer for the SQLite record indexer.
//!
//! Provides:
//! - [`Store`]: an embedded SQLite database shared by every table in a run,
//!   with a coarse exclusive lock for serializing record writes
//! - [`Table`]: the contract a storage target implements (schema + row write)
//! - [`ExampleTable`]: a two-column table storing each record as JSON
//! - DSN handling for `:memory:`, `scheme://mem` and on-disk URIs

pub mod dsn;
pub mod error;
pub mod example;
pub mod store;
pub mod table;

pub use dsn::{dsn_from_uri, Dsn};
pub use error::StorageError;
pub use example::ExampleTable;
pub use store::{Store, StoreLock};
pub use table::Table;
