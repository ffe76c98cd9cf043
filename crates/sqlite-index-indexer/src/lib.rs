//! # sqlite-index-indexer
//!
//! Loads records discovered by a record source and writes them to one or
//! more SQLite tables.
//!
//! ## Write path
//!
//! Sources may call the indexer from many workers at once. Loading runs
//! concurrently; table writes for one record happen under the store's
//! exclusive lock, so only one record is written at a time. The post-index
//! hook runs after the lock is released.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlite_index_indexer::{loader_fn, Indexer, IndexerConfig};
//! use sqlite_index_storage::{ExampleTable, Store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Store::open("index.db")?);
//! let config = IndexerConfig::new()
//!     .with_store(store)
//!     .with_table(ExampleTable::new())
//!     .with_loader(loader_fn(|mut record| {
//!         let body = record.read_to_string()?;
//!         Ok(Some(body.len()))
//!     }))
//!     .with_ensure_schema(true);
//!
//! let indexer = Indexer::new(config)?.with_timings(true);
//! indexer.run("directory://", &["/data".to_string()]).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod indexer;
pub mod loader;
pub mod observer;
pub mod timings;

pub use config::{IndexerConfig, DEFAULT_TIMINGS_INTERVAL};
pub use error::IndexingError;
pub use indexer::Indexer;
pub use loader::{hook_fn, loader_fn, FnHook, FnLoader, PostIndexHook, RecordLoader};
pub use observer::{IndexObserver, LoggingObserver, NoOpObserver};
pub use timings::{report, TimingReporter, TimingStats};
