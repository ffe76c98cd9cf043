//! Database URI to DSN conversion.
//!
//! Accepted forms:
//! - `:memory:`, `mem`, `<scheme>://mem` -> a private in-memory database
//! - `file:...` -> passed through unchanged
//! - `<scheme>://<path>[?query][#fragment]` -> `file:<path>?cache=shared&mode=rwc[&query]`
//! - a bare path -> `file:<path>?cache=shared&mode=rwc`

use url::{ParseError, Url};

use crate::error::StorageError;

/// A resolved database location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dsn {
    /// In-memory database owned by a single connection
    Memory,
    /// SQLite URI filename (always starts with `file:`)
    File(String),
}

impl Dsn {
    /// Render the DSN as a string suitable for logging.
    pub fn as_str(&self) -> &str {
        match self {
            Dsn::Memory => ":memory:",
            Dsn::File(dsn) => dsn,
        }
    }
}

/// Convert a database URI or path into a [`Dsn`].
pub fn dsn_from_uri(uri: &str) -> Result<Dsn, StorageError> {
    let uri = uri.trim();

    if uri.is_empty() {
        return Err(StorageError::Dsn("empty database URI".to_string()));
    }

    if uri == ":memory:" || uri == "mem" {
        return Ok(Dsn::Memory);
    }

    if uri.starts_with("file:") {
        return Ok(Dsn::File(uri.to_string()));
    }

    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) if !uri.contains("://") => {
            return Ok(Dsn::File(file_dsn(uri, None)));
        }
        Err(e) => {
            return Err(StorageError::Dsn(format!("invalid database URI '{}': {}", uri, e)));
        }
    };

    // `sqlite://index.db` puts the file name in the host position.
    let location = format!("{}{}", url.host_str().unwrap_or_default(), url.path());

    if location == "mem" {
        return Ok(Dsn::Memory);
    }

    if location.is_empty() {
        return Err(StorageError::Dsn(format!("missing path in '{}'", uri)));
    }

    Ok(Dsn::File(file_dsn(&location, url.query().filter(|q| !q.is_empty()))))
}

fn file_dsn(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("file:{}?cache=shared&mode=rwc&{}", path, query),
        None => format!("file:{}?cache=shared&mode=rwc", path),
    }
}
