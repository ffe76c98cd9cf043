//! SQLite wrapper shared by every table in an indexing run.
//!
//! Provides:
//! - Database open/close from a DSN or URI
//! - Connection acquisition and transaction scoping
//! - A coarse exclusive lock held across one record's table writes
//! - Schema helpers used by [`Table::ensure_schema`](crate::Table::ensure_schema)

use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, Transaction};
use tracing::{debug, info};

use crate::dsn::{dsn_from_uri, Dsn};
use crate::error::StorageError;

/// Pragmas applied by [`Store::live_hard_die_fast`].
const PERFORMANCE_PRAGMAS: &[(&str, &str)] = &[
    ("synchronous", "OFF"),
    ("journal_mode", "MEMORY"),
    ("temp_store", "MEMORY"),
    ("locking_mode", "EXCLUSIVE"),
    ("page_size", "4096"),
    ("cache_size", "1000000"),
];

/// Embedded SQLite database handle.
///
/// The store owns a single connection. Record writes are serialized by
/// [`Store::lock`], which is independent of the connection mutex so that a
/// caller can hold the write gate across several table writes while each
/// table still acquires the connection on its own.
pub struct Store {
    dsn: Dsn,
    conn: Mutex<Connection>,
    write_gate: tokio::sync::Mutex<()>,
}

/// Guard returned by [`Store::lock`]. Dropping it unlocks the store.
#[must_use = "the store is unlocked as soon as the guard is dropped"]
pub struct StoreLock<'a> {
    _guard: tokio::sync::MutexGuard<'a, ()>,
}

impl Store {
    /// Open the database described by `uri`, creating it if necessary.
    pub fn open(uri: &str) -> Result<Self, StorageError> {
        let dsn = dsn_from_uri(uri)?;
        info!(dsn = %dsn.as_str(), "Opening store");

        let conn = match &dsn {
            Dsn::Memory => Connection::open_in_memory()?,
            Dsn::File(path) => Connection::open(path)?,
        };

        Ok(Self::from_connection(dsn, conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::open(":memory:")
    }

    fn from_connection(dsn: Dsn, conn: Connection) -> Self {
        Self {
            dsn,
            conn: Mutex::new(conn),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// The resolved DSN this store was opened with.
    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    /// Apply performance pragmas at the expense of durability.
    pub fn live_hard_die_fast(&self) -> Result<(), StorageError> {
        let conn = self.conn();
        for (name, value) in PERFORMANCE_PRAGMAS {
            conn.pragma_update(None, name, value)?;
            debug!(pragma = %name, value = %value, "Applied pragma");
        }
        Ok(())
    }

    /// Acquire the exclusive write lock.
    ///
    /// Only one holder at a time; waiters are queued in FIFO order.
    pub async fn lock(&self) -> StoreLock<'_> {
        StoreLock {
            _guard: self.write_gate.lock().await,
        }
    }

    /// Try to acquire the exclusive write lock without waiting.
    pub fn try_lock(&self) -> Option<StoreLock<'_>> {
        self.write_gate
            .try_lock()
            .ok()
            .map(|guard| StoreLock { _guard: guard })
    }

    /// Whether the exclusive write lock is currently held.
    pub fn is_locked(&self) -> bool {
        self.write_gate.try_lock().is_err()
    }

    /// Acquire the underlying connection.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back when it returns `Err`.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, StorageError>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Whether a table named `name` exists.
    pub fn has_table(&self, name: &str) -> Result<bool, StorageError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Execute `schema` unless a table named `name` already exists.
    ///
    /// Returns `true` if the table was created.
    pub fn create_table_if_necessary(&self, name: &str, schema: &str) -> Result<bool, StorageError> {
        if self.has_table(name)? {
            debug!(table = %name, "Table already exists");
            return Ok(false);
        }

        self.conn().execute_batch(schema)?;
        info!(table = %name, "Created table");
        Ok(true)
    }

    /// Number of rows in table `name`.
    pub fn row_count(&self, name: &str) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(name));
        let count: i64 = self.conn().query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Close the database, flushing pending work.
    pub fn close(self) -> Result<(), StorageError> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
        info!(dsn = %self.dsn.as_str(), "Closed store");
        Ok(())
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
