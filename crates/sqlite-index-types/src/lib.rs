//! # sqlite-index-types
//!
//! Shared types for the SQLite record indexer.
//!
//! - [`Record`]: one discovered unit of input (identifier, rewindable content, extras)
//! - [`RecordExtras`]: bounded, source-defined metadata attached to a record
//! - [`Settings`]: layered configuration for the `sqlite-index` binary
//! - [`TypesError`]: configuration and input errors

pub mod config;
pub mod error;
pub mod record;

pub use config::Settings;
pub use error::TypesError;
pub use record::{BoxError, ReadSeek, Record, RecordExtras};
