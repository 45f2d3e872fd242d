//! Status classification and the visibility rules derived from it.

use crate::entry::{Entry, Status};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Which of the policy's sets a status belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub ignored: bool,
    pub clean: bool,
    /// Significant statuses keep hidden-named entries visible.
    pub significant: bool,
}

/// Gives status tags their meaning.
pub trait StatusPolicy {
    fn classify(&self, status: &Status) -> Classification;

    /// Name prefix marking hidden entries, `None` if names never hide.
    fn hidden_marker(&self) -> Option<&str> {
        Some(".")
    }

    /// Status of a file that is on disk but absent from the status report.
    fn on_disk_default(&self) -> Status {
        Status::unknown()
    }

    /// Derives a directory's status from the statuses of its contents.
    fn aggregate(&self, _statuses: &mut dyn Iterator<Item = &Status>) -> Status {
        Status::unknown()
    }

    /// Applies the `show_hidden` / `hide_clean` filters to one entry.
    fn is_visible(&self, entry: &Entry, show_hidden: bool, hide_clean: bool) -> bool {
        let class = self.classify(entry.status());
        if !show_hidden {
            if class.ignored {
                return false;
            }
            let hidden_name = self
                .hidden_marker()
                .is_some_and(|marker| entry.name().starts_with(marker));
            if hidden_name && !class.significant {
                return false;
            }
        }
        !(hide_clean && class.clean)
    }
}

/// Policy for a bare filesystem tree: no status carries meaning, only
/// dot-names are hidden.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPolicy;

impl StatusPolicy for PlainPolicy {
    fn classify(&self, _status: &Status) -> Classification {
        Classification::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateRule {
    /// The first tag found among a directory's contents becomes its status.
    pub precedence: Vec<String>,
    /// Used when no tag from `precedence` is present.
    pub default: Option<String>,
}

impl Default for AggregateRule {
    fn default() -> Self {
        AggregateRule {
            precedence: ["M", "A", "R", "!", "?"].map(String::from).to_vec(),
            default: Some("C".to_string()),
        }
    }
}

/// A policy defined by sets of tags, loadable from TOML.
///
/// The defaults match the status listing format read by
/// [`parse_listing`](crate::parse_listing).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagPolicy {
    pub hidden_marker: String,
    pub on_disk_default: Option<String>,
    pub ignored: BTreeSet<String>,
    pub clean: BTreeSet<String>,
    pub significant: BTreeSet<String>,
    pub aggregate: AggregateRule,
}

impl Default for TagPolicy {
    fn default() -> Self {
        TagPolicy {
            hidden_marker: ".".to_string(),
            on_disk_default: Some("?".to_string()),
            ignored: BTreeSet::from(["I".to_string()]),
            clean: BTreeSet::from(["C".to_string()]),
            significant: ["M", "A", "R", "!"].map(String::from).into(),
            aggregate: AggregateRule::default(),
        }
    }
}

impl TagPolicy {
    /// Parses a policy from TOML; omitted keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                PolicyError::PermissionDenied(path.to_path_buf())
            } else {
                PolicyError::Io(e)
            }
        })?;

        Self::from_toml(&content)
    }
}

impl StatusPolicy for TagPolicy {
    fn classify(&self, status: &Status) -> Classification {
        match status.tag() {
            None => Classification::default(),
            Some(tag) => Classification {
                ignored: self.ignored.contains(tag),
                clean: self.clean.contains(tag),
                significant: self.significant.contains(tag),
            },
        }
    }

    fn hidden_marker(&self) -> Option<&str> {
        Some(self.hidden_marker.as_str()).filter(|marker| !marker.is_empty())
    }

    fn on_disk_default(&self) -> Status {
        self.on_disk_default
            .as_deref()
            .map(Status::new)
            .unwrap_or_default()
    }

    fn aggregate(&self, statuses: &mut dyn Iterator<Item = &Status>) -> Status {
        let present: HashSet<&str> = statuses.filter_map(Status::tag).collect();

        self.aggregate
            .precedence
            .iter()
            .find(|tag| present.contains(tag.as_str()))
            .or(self.aggregate.default.as_ref())
            .map(|tag| Status::new(tag.as_str()))
            .unwrap_or_default()
    }
}
