//! Where raw status text comes from.

use crate::entry::Change;
use crate::report::{ParseError, parse_listing};
use crate::snapshot::Snapshot;
use crate::util::hashing::DigestBuilder;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

/// Supplies and parses the raw status report a database is built from.
pub trait StatusSource {
    /// Returns the raw report, feeding exactly its bytes into `hasher`.
    ///
    /// Called once when the database is built and again on every staleness
    /// check, so a database notices when the report changes.
    fn status_text(&self, hasher: &mut DigestBuilder) -> Result<String, SourceError>;

    fn parse_changes(&self, text: &str) -> Result<Vec<Change>, ParseError>;

    fn parse_snapshot(&self, text: &str) -> Result<Snapshot, ParseError> {
        Ok(Snapshot::new(self.parse_changes(text)?))
    }
}

#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Inline(String),
}

/// A status listing read from a file or held in memory.
#[derive(Debug, Clone)]
pub struct TextSource {
    origin: Origin,
}

impl TextSource {
    /// Reads the report from `path`, again on each staleness check.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        TextSource {
            origin: Origin::File(path.into()),
        }
    }

    /// A fixed report, e.g. captured from a pipe. Never goes stale.
    pub fn inline(text: impl Into<String>) -> Self {
        TextSource {
            origin: Origin::Inline(text.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Inline(_) => None,
        }
    }
}

impl StatusSource for TextSource {
    fn status_text(&self, hasher: &mut DigestBuilder) -> Result<String, SourceError> {
        let text = match &self.origin {
            Origin::File(path) => std::fs::read_to_string(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    SourceError::PermissionDenied(path.clone())
                } else {
                    SourceError::Io(e)
                }
            })?,
            Origin::Inline(text) => text.clone(),
        };

        hasher.update(text.as_bytes());
        Ok(text)
    }

    fn parse_changes(&self, text: &str) -> Result<Vec<Change>, ParseError> {
        parse_listing(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn digest_of(source: &TextSource) -> crate::util::hashing::Digest {
        let mut hasher = DigestBuilder::new();
        source.status_text(&mut hasher).unwrap();
        hasher.finish()
    }

    #[test]
    fn test_file_source_rereads_file() {
        let temp = TempDir::new().unwrap();
        let report = temp.path().join("status.txt");
        fs::write(&report, "M a.txt\n").unwrap();

        let source = TextSource::file(&report);
        let first = digest_of(&source);
        assert_eq!(digest_of(&source), first);

        fs::write(&report, "M a.txt\nA b.txt\n").unwrap();
        assert_ne!(digest_of(&source), first);
        assert_eq!(source.path(), Some(report.as_path()));
    }

    #[test]
    fn test_inline_source_hashes_text() {
        let source = TextSource::inline("M a.txt\n");

        let mut expected = DigestBuilder::new();
        expected.update(b"M a.txt\n");

        assert_eq!(digest_of(&source), expected.finish());
        assert!(source.path().is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = TextSource::file("/nonexistent/status.txt");
        let mut hasher = DigestBuilder::new();

        assert!(matches!(
            source.status_text(&mut hasher),
            Err(SourceError::Io(_))
        ));
    }

    #[test]
    fn test_parse_snapshot_uses_listing_grammar() {
        let source = TextSource::inline("");
        let snapshot = source.parse_snapshot("M b\nA a\n").unwrap();

        assert_eq!(snapshot.paths().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
