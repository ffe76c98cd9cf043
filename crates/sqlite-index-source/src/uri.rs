//! Source URI parsing.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::SourceError;

/// Supported discovery schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Walk each identifier as a directory
    Directory,
    /// Walk `<identifier>/data`
    Repo,
    /// Treat each identifier as a single file
    File,
    /// Read each identifier as a list of paths
    FileList,
}

impl Scheme {
    /// Every supported scheme, in display order.
    pub const ALL: [Scheme; 4] = [Scheme::Directory, Scheme::Repo, Scheme::File, Scheme::FileList];

    /// Scheme name as it appears in a URI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Directory => "directory",
            Scheme::Repo => "repo",
            Scheme::File => "file",
            Scheme::FileList => "filelist",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s)
            .ok_or_else(|| SourceError::UnknownScheme(s.to_string()))
    }
}

/// A parsed source URI such as `directory://?workers=4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUri {
    /// The URI as given
    pub raw: String,
    /// Discovery scheme
    pub scheme: Scheme,
    /// Worker bound from `?workers=N`; `None` or `0` means default
    pub workers: Option<usize>,
}

impl SourceUri {
    /// Parse a source URI.
    ///
    /// Scheme names are case-insensitive and query values are percent-decoded.
    /// Any fragment is ignored.
    pub fn parse(uri: &str) -> Result<Self, SourceError> {
        let url = Url::parse(uri).map_err(|e| {
            SourceError::InvalidUri(format!(
                "'{}' is not a valid source URI (expected e.g. directory://): {}",
                uri, e
            ))
        })?;

        let scheme: Scheme = url.scheme().parse()?;

        let mut workers = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "workers" => {
                    let n = value.parse::<usize>().map_err(|_| {
                        SourceError::InvalidUri(format!(
                            "workers must be a non-negative integer, got '{}'",
                            value
                        ))
                    })?;
                    workers = Some(n);
                }
                other => {
                    return Err(SourceError::InvalidUri(format!(
                        "unknown query parameter '{}'",
                        other
                    )));
                }
            }
        }

        Ok(Self {
            raw: uri.to_string(),
            scheme,
            workers,
        })
    }

    /// Effective worker count: the configured bound, or available parallelism.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schemes() {
        assert_eq!(SourceUri::parse("directory://").unwrap().scheme, Scheme::Directory);
        assert_eq!(SourceUri::parse("repo://").unwrap().scheme, Scheme::Repo);
        assert_eq!(SourceUri::parse("file://").unwrap().scheme, Scheme::File);
        assert_eq!(SourceUri::parse("filelist://").unwrap().scheme, Scheme::FileList);
    }

    #[test]
    fn test_parse_workers() {
        let uri = SourceUri::parse("directory://?workers=3").unwrap();
        assert_eq!(uri.workers, Some(3));
        assert_eq!(uri.effective_workers(), 3);

        let uri = SourceUri::parse("directory://?workers=0").unwrap();
        assert!(uri.effective_workers() >= 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            SourceUri::parse("directory"),
            Err(SourceError::InvalidUri(_))
        ));
        assert!(matches!(
            SourceUri::parse("ftp://example.com"),
            Err(SourceError::UnknownScheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            SourceUri::parse("://"),
            Err(SourceError::InvalidUri(_))
        ));
        assert!(matches!(
            SourceUri::parse("directory://?workers=many"),
            Err(SourceError::InvalidUri(_))
        ));
        assert!(matches!(
            SourceUri::parse("directory://?colour=blue"),
            Err(SourceError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_parse_decodes_query() {
        let uri = SourceUri::parse("directory://?workers=%34").unwrap();
        assert_eq!(uri.workers, Some(4));

        let uri = SourceUri::parse("repo://?workers=2&").unwrap();
        assert_eq!(uri.workers, Some(2));
    }

    #[test]
    fn test_parse_scheme_case_insensitive() {
        assert_eq!(SourceUri::parse("Directory://").unwrap().scheme, Scheme::Directory);
        assert_eq!(SourceUri::parse("FILELIST://").unwrap().scheme, Scheme::FileList);
    }

    #[test]
    fn test_parse_ignores_fragment() {
        let uri = SourceUri::parse("directory://?workers=4#frag").unwrap();
        assert_eq!(uri.scheme, Scheme::Directory);
        assert_eq!(uri.workers, Some(4));
    }

    #[test]
    fn test_scheme_display() {
        assert_eq!(Scheme::FileList.to_string(), "filelist://");
    }
}
