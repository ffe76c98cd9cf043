//! Error types for the indexer.

use sqlite_index_source::SourceError;
use sqlite_index_storage::StorageError;
use sqlite_index_types::BoxError;
use thiserror::Error;

/// Errors that abort an indexing run.
///
/// None of these are retried; the first one observed is returned by
/// [`Indexer::run`](crate::Indexer::run).
#[derive(Debug, Error)]
pub enum IndexingError {
    /// The indexer was built from an incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The loader failed for a record
    #[error("Failed to load {uri}: {source}")]
    Load {
        uri: String,
        #[source]
        source: BoxError,
    },

    /// A table rejected a record
    #[error("Failed to write {uri} to table '{table}': {source}")]
    Write {
        uri: String,
        table: String,
        #[source]
        source: StorageError,
    },

    /// The blocking table-write task panicked or was cancelled
    #[error("Write task for {uri} failed: {source}")]
    Task {
        uri: String,
        #[source]
        source: tokio::task::JoinError,
    },

    /// The post-index hook failed after the record was committed
    #[error("Post-index hook failed for {uri}: {source}")]
    Hook {
        uri: String,
        #[source]
        source: BoxError,
    },

    /// The record source could not be built or failed to enumerate
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Store setup failed (schema creation)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IndexingError {
    /// Identifier of the record that caused the failure, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            IndexingError::Load { uri, .. }
            | IndexingError::Write { uri, .. }
            | IndexingError::Task { uri, .. }
            | IndexingError::Hook { uri, .. } => Some(uri),
            IndexingError::Source(SourceError::Callback { uri, .. }) => Some(uri),
            _ => None,
        }
    }
}
