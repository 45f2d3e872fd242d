//! Parser for the status listing format.
//!
//! One entry per line, a single status character, a space and a path:
//!
//! ```text
//! M src/lib.rs
//! A src/new.rs
//!   src/old.rs
//! R src/old.rs
//! ? notes.txt
//! ```
//!
//! A line indented by two spaces names the copy source of the `A` line just
//! above it. When that source is reported removed (`R`) the pair is a move,
//! otherwise a copy. Codes: `M` modified, `A` added, `R` removed, `C` clean,
//! `!` missing, `?` untracked, `I` ignored.

use crate::entry::{Change, Related, Relation, Status};
use std::collections::HashMap;

const STATUS_CODES: &str = "MARC!?I";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: unknown status code {code:?}")]
    UnknownCode { line: usize, code: char },
    #[error("line {line}: expected \"<code> <path>\"")]
    MissingSeparator { line: usize },
    #[error("line {line}: empty path")]
    EmptyPath { line: usize },
    #[error("line {line}: path {path:?} is not a plain relative path")]
    InvalidPath { line: usize, path: String },
    #[error("line {line}: copy source without an added file on the line above")]
    OrphanSource { line: usize },
}

/// Parses a status listing into changes, in report order.
pub fn parse_listing(text: &str) -> Result<Vec<Change>, ParseError> {
    let mut changes: Vec<Change> = Vec::new();
    let mut copies: Vec<(usize, String)> = Vec::new();
    let mut last_added: Option<usize> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if line.trim().is_empty() {
            last_added = None;
            continue;
        }

        if let Some(source) = line.strip_prefix("  ") {
            let dest = last_added
                .take()
                .ok_or(ParseError::OrphanSource { line: line_no })?;
            let source = normalize_path(source, line_no)?;
            copies.push((dest, source));
            continue;
        }

        let mut chars = line.chars();
        let code = chars.next().unwrap_or(' ');
        if chars.next() != Some(' ') {
            return Err(ParseError::MissingSeparator { line: line_no });
        }
        if !STATUS_CODES.contains(code) {
            return Err(ParseError::UnknownCode {
                line: line_no,
                code,
            });
        }

        let path = normalize_path(chars.as_str(), line_no)?;
        last_added = (code == 'A').then_some(changes.len());
        changes.push(Change::new(path, Status::new(code)));
    }

    link_copies(&mut changes, copies);

    Ok(changes)
}

fn normalize_path(path: &str, line_no: usize) -> Result<String, ParseError> {
    let path = path.trim_start_matches("./");
    if path.is_empty() || path == "/" {
        return Err(ParseError::EmptyPath { line: line_no });
    }
    if !is_valid_path(path) {
        return Err(ParseError::InvalidPath {
            line: line_no,
            path: path.to_string(),
        });
    }
    Ok(path.to_string())
}

/// Whether `path` is relative, `/`-separated, and free of empty, `.` and
/// `..` segments. A single trailing `/` (a directory status) is allowed.
pub(crate) fn is_valid_path(path: &str) -> bool {
    let path = path.strip_suffix('/').unwrap_or(path);
    !path.is_empty()
        && path
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
}

fn link_copies(changes: &mut [Change], copies: Vec<(usize, String)>) {
    if copies.is_empty() {
        return;
    }

    let mut by_path: HashMap<String, usize> = HashMap::new();
    for (index, change) in changes.iter().enumerate() {
        by_path.insert(change.path.clone(), index);
    }

    for (dest, source) in copies {
        let dest_path = changes[dest].path.clone();
        let source_index = by_path.get(&source).copied();
        let moved = source_index.is_some_and(|i| changes[i].status.tag() == Some("R"));

        let (forward, backward) = if moved {
            (Relation::MovedFrom, Relation::MovedTo)
        } else {
            (Relation::CopiedFrom, Relation::CopiedTo)
        };

        changes[dest].related = Some(Related::new(source, forward));
        if let Some(i) = source_index
            && changes[i].related.is_none()
        {
            changes[i].related = Some(Related::new(dest_path, backward));
        }
    }
}
