//! Error types for record discovery.

use sqlite_index_types::BoxError;
use thiserror::Error;

/// Errors raised while constructing a source or enumerating records.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source URI could not be parsed
    #[error("Invalid source URI: {0}")]
    InvalidUri(String),

    /// The URI scheme is not one of the supported schemes
    #[error("Unknown source scheme '{0}'")]
    UnknownScheme(String),

    /// A file could not be opened or read
    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The per-record callback failed
    #[error("Callback failed for {uri}: {source}")]
    Callback {
        uri: String,
        #[source]
        source: BoxError,
    },

    /// A record worker panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl SourceError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }
}
