//! Values carried by the tree: statuses, entries and parsed report lines.

use std::fmt;

/// An opaque, comparable status tag.
///
/// The tag carries no meaning of its own; a [`StatusPolicy`](crate::StatusPolicy)
/// decides which tags are clean, ignored or significant. The unknown status
/// (no tag) is what a plain filesystem listing produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Status(Option<String>);

impl Status {
    pub fn unknown() -> Self {
        Status(None)
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Status(Some(tag.into()))
    }

    pub fn tag(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_none()
    }
}

impl From<&str> for Status {
    fn from(tag: &str) -> Self {
        Status::new(tag)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().unwrap_or(""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    CopiedFrom,
    CopiedTo,
    MovedFrom,
    MovedTo,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::CopiedFrom => "copied from",
            Relation::CopiedTo => "copied to",
            Relation::MovedFrom => "moved from",
            Relation::MovedTo => "moved to",
        })
    }
}

/// The other end of a copy or rename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Related {
    pub path: String,
    pub relation: Relation,
}

impl Related {
    pub fn new(path: impl Into<String>, relation: Relation) -> Self {
        Related {
            path: path.into(),
            relation,
        }
    }
}

/// One file or directory record in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    status: Status,
    related: Option<Related>,
}

impl Entry {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Entry {
            name: name.into(),
            status,
            related: None,
        }
    }

    pub fn with_related(name: impl Into<String>, status: Status, related: Option<Related>) -> Self {
        Entry {
            name: name.into(),
            status,
            related,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn related(&self) -> Option<&Related> {
        self.related.as_ref()
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }
}

/// One line of a parsed status report.
///
/// `path` is relative to the database root and `/`-separated. A trailing `/`
/// marks a status reported for a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub path: String,
    pub status: Status,
    pub related: Option<Related>,
}

impl Change {
    pub fn new(path: impl Into<String>, status: impl Into<Status>) -> Self {
        Change {
            path: path.into(),
            status: status.into(),
            related: None,
        }
    }

    pub fn with_related(mut self, related: Related) -> Self {
        self.related = Some(related);
        self
    }
}
