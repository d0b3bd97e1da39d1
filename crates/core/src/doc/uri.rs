//! Document identifiers.
//!
//! A [`DocUri`] is a scheme-qualified content identifier. Real files live
//! under the `file` scheme; scratch documents live under the
//! `merge-scratch` scheme so they can never be confused with the target
//! file they shadow, even though they share its path.

use std::fmt;
use std::path::Path;

use crate::errors::DocumentError;

/// Scheme for documents backed by a file on disk.
pub const SCHEME_FILE: &str = "file";

/// Scheme for in-memory scratch documents.
pub const SCHEME_SCRATCH: &str = "merge-scratch";

/// A scheme-qualified document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocUri {
    scheme: String,
    path: String,
}

impl DocUri {
    /// Builds a `file` scheme uri for a path on disk.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            scheme: SCHEME_FILE.to_string(),
            path: path.into(),
        }
    }

    /// Builds the scratch uri shadowing `target`: same path, scratch scheme.
    pub fn scratch_of(target: &DocUri) -> Self {
        Self {
            scheme: SCHEME_SCRATCH.to_string(),
            path: target.path.clone(),
        }
    }

    /// Parses `scheme://path` form. A bare path with no scheme separator is
    /// taken as a `file` uri.
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let (scheme, path) = match input.split_once("://") {
            Some((scheme, path)) => (scheme, path),
            None => (SCHEME_FILE, input),
        };

        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DocumentError::InvalidUri {
                input: input.to_string(),
                detail: format!("invalid scheme '{scheme}'"),
            });
        }
        if path.is_empty() {
            return Err(DocumentError::InvalidUri {
                input: input.to_string(),
                detail: "empty path".to_string(),
            });
        }

        Ok(Self {
            scheme: scheme.to_string(),
            path: path.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_file(&self) -> bool {
        self.scheme == SCHEME_FILE
    }

    pub fn is_scratch(&self) -> bool {
        self.scheme == SCHEME_SCRATCH
    }

    /// The path's extension, if any.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.path).extension().and_then(|e| e.to_str())
    }

    /// The final path component, if any.
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path).file_name().and_then(|n| n.to_str())
    }
}

impl fmt::Display for DocUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheme_qualified() {
        let uri = DocUri::parse("file:///tmp/a.rs").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.path(), "/tmp/a.rs");
        assert!(uri.is_file());
    }

    #[test]
    fn test_parse_bare_path_defaults_to_file() {
        let uri = DocUri::parse("/tmp/b.md").unwrap();
        assert!(uri.is_file());
        assert_eq!(uri.path(), "/tmp/b.md");
    }

    #[test]
    fn test_display_round_trip() {
        let uri = DocUri::parse("merge-scratch:///tmp/a.rs").unwrap();
        assert_eq!(DocUri::parse(&uri.to_string()).unwrap(), uri);
    }

    #[test]
    fn test_parse_rejects_empty_scheme_and_path() {
        assert!(DocUri::parse("://x").is_err());
        assert!(DocUri::parse("file://").is_err());
        assert!(DocUri::parse("under_score://x").is_err());
    }

    #[test]
    fn test_scratch_of_shares_path_but_not_identity() {
        let target = DocUri::file("/work/main.rs");
        let scratch = DocUri::scratch_of(&target);
        assert!(scratch.is_scratch());
        assert_eq!(scratch.path(), target.path());
        assert_ne!(scratch, target);
        assert_eq!(scratch.extension(), Some("rs"));
    }

    #[test]
    fn test_extension_and_file_name() {
        let uri = DocUri::file("/a/b/c.tar.gz");
        assert_eq!(uri.extension(), Some("gz"));
        assert_eq!(uri.file_name(), Some("c.tar.gz"));

        let bare = DocUri::file("/a/b/Makefile");
        assert_eq!(bare.extension(), None);
        assert_eq!(bare.file_name(), Some("Makefile"));
    }
}
