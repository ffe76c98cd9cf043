//! Discovered records.
//!
//! A [`Record`] is produced by a record source, handed to a loader exactly
//! once, and dropped afterwards. Its content handle is rewindable so a loader
//! can make several passes over the bytes.

use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Error type returned by pluggable code (loaders, hooks, callbacks).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Readable, seekable content that can move between worker threads.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Source-defined metadata attached to a record.
///
/// This is a closed set of fields rather than an open argument list: sources
/// fill in what they know and leave the rest as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordExtras {
    /// URI of the source that discovered the record (e.g. `directory://`).
    pub source_uri: Option<String>,
    /// Identifier the record was discovered under (a directory, a file list).
    pub root: Option<String>,
    /// Zero-based discovery order within one enumeration.
    pub index: Option<u64>,
}

impl RecordExtras {
    /// Create extras for a record discovered by `source_uri` under `root`.
    pub fn new(source_uri: impl Into<String>, root: impl Into<String>, index: u64) -> Self {
        Self {
            source_uri: Some(source_uri.into()),
            root: Some(root.into()),
            index: Some(index),
        }
    }
}

/// One discovered unit of input.
pub struct Record {
    /// Opaque, source-defined identifier (usually a path).
    pub uri: String,
    /// Rewindable content handle.
    pub content: Box<dyn ReadSeek>,
    /// Source-defined metadata.
    pub extras: RecordExtras,
}

impl Record {
    /// Create a record from any seekable reader.
    pub fn new(uri: impl Into<String>, content: impl ReadSeek + 'static) -> Self {
        Self {
            uri: uri.into(),
            content: Box::new(content),
            extras: RecordExtras::default(),
        }
    }

    /// Create a record backed by an in-memory buffer.
    pub fn from_bytes(uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(uri, Cursor::new(bytes.into()))
    }

    /// Attach source metadata.
    pub fn with_extras(mut self, extras: RecordExtras) -> Self {
        self.extras = extras;
        self
    }

    /// Seek the content back to its start.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.content.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Read the whole content from the start.
    pub fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        self.rewind()?;
        let mut buf = Vec::new();
        self.content.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read the whole content from the start as UTF-8.
    pub fn read_to_string(&mut self) -> io::Result<String> {
        self.rewind()?;
        let mut buf = String::new();
        self.content.read_to_string(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("uri", &self.uri)
            .field("extras", &self.extras)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_is_rewindable() {
        let mut record = Record::from_bytes("a.json", b"{\"id\":1}".to_vec());

        assert_eq!(record.read_to_string().unwrap(), "{\"id\":1}");
        // Second pass starts from the beginning again
        assert_eq!(record.read_to_end().unwrap(), b"{\"id\":1}".to_vec());
    }

    #[test]
    fn test_partial_read_then_rewind() {
        let mut record = Record::from_bytes("b.txt", b"hello world".to_vec());

        let mut head = [0u8; 5];
        record.content.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"hello");

        assert_eq!(record.read_to_string().unwrap(), "hello world");
    }

    #[test]
    fn test_extras() {
        let record = Record::from_bytes("c.txt", Vec::new())
            .with_extras(RecordExtras::new("directory://", "/data", 7));

        assert_eq!(record.extras.source_uri.as_deref(), Some("directory://"));
        assert_eq!(record.extras.root.as_deref(), Some("/data"));
        assert_eq!(record.extras.index, Some(7));
    }

    #[test]
    fn test_debug_omits_content() {
        let record = Record::from_bytes("d.txt", b"secret".to_vec());
        let debug = format!("{:?}", record);
        assert!(debug.contains("d.txt"));
        assert!(!debug.contains("secret"));
    }
}
