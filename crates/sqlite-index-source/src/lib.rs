//! Record discovery for the SQLite record indexer.
//!
//! A [`RecordSource`] is built from a source URI and a [`RecordCallback`].
//! `enumerate` discovers records for each identifier and hands every record
//! to the callback, running up to `workers` callbacks concurrently.
//!
//! ## Schemes
//!
//! - `directory://` - each identifier is a directory, walked recursively
//! - `repo://` - each identifier is a repository root; its `data` directory is walked
//! - `file://` - each identifier is a single file
//! - `filelist://` - each identifier is a file listing one path per line
//!
//! Query parameters: `workers=N` bounds the number of records processed at
//! once (default: available parallelism).
//!
//! ## Failure semantics
//!
//! The first failure stops discovery. Records already in flight are allowed
//! to finish, and the failure with the lowest discovery index is returned.

pub mod error;
pub mod source;
pub mod uri;

pub use error::SourceError;
pub use source::{new_source, schemes, RecordCallback, RecordSource, SeenCounter, WalkingSource};
pub use uri::{Scheme, SourceUri};
