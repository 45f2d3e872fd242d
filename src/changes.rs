//! Trees built entirely from a list of changes, with no filesystem behind
//! them, e.g. the files touched by a patch that is not applied.

use crate::entry::{Change, Entry, Status};
use crate::file_dir::{ChildSource, FileDir, Population};
use crate::policy::StatusPolicy;
use crate::report::is_valid_path;
use crate::util::hashing::Digest;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Child source of a synthetic tree: every node is complete when built.
///
/// Holds the status a report gave the directory itself, if any.
#[derive(Debug, Clone, Default)]
pub struct Detached {
    reported: Option<Status>,
}

impl ChildSource for Detached {
    const REPOPULATES: bool = false;

    fn populate(&self, _dir: &Path, _policy: &dyn StatusPolicy) -> Population<Self> {
        Population::default()
    }

    fn current_digest(&self, _dir: &Path) -> Option<Digest> {
        None
    }
}

impl FileDir<Detached> {
    pub(crate) fn synthetic(name: &str, path: PathBuf) -> Self {
        let mut dir = FileDir::new(Entry::new(name, Status::unknown()), path, Detached::default());
        dir.populated = true;
        dir
    }

    /// Inserts one change, creating intermediate directories as needed.
    ///
    /// A path ending in `/` sets a directory's own status. Paths with empty,
    /// `.` or `..` segments are ignored. Files are only sorted, deduplicated
    /// and checked against directories of the same name by
    /// [`finalize`](Self::finalize).
    pub fn add_file(&mut self, change: Change) {
        let Change {
            path,
            status,
            related,
        } = change;
        if !is_valid_path(&path) {
            warn!("Ignoring change for invalid path {:?}", path);
            return;
        }
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

        let (dir_segments, file_name) = if path.ends_with('/') {
            (&segments[..], None)
        } else {
            match segments.split_last() {
                Some((name, parents)) => (parents, Some(*name)),
                None => return,
            }
        };

        let mut node = self;
        for segment in dir_segments {
            let child_path = node.path.join(segment);
            node = node
                .dirs
                .entry(segment.to_string())
                .or_insert_with(|| FileDir::synthetic(segment, child_path));
        }

        match file_name {
            None => node.source.reported = Some(status),
            Some(name) => node.files.push(Entry::with_related(name, status, related)),
        }
    }

    /// Sorts every node's files and derives directory statuses bottom-up.
    ///
    /// When a file is reported twice the later change wins. A name that is
    /// also a directory stays a directory, and the file's status becomes the
    /// directory's own unless a `dir/` line gave one. A directory's own
    /// status wins over the one aggregated from its contents.
    pub fn finalize(&mut self, policy: &dyn StatusPolicy) {
        // Stable, so duplicates stay in report order; keep the last one.
        self.files.sort_by(|a, b| a.name().cmp(b.name()));
        self.files.dedup_by(|later, earlier| {
            let same = later.name() == earlier.name();
            if same {
                std::mem::swap(later, earlier);
            }
            same
        });

        let dirs = &mut self.dirs;
        self.files.retain(|file| match dirs.get_mut(file.name()) {
            Some(dir) => {
                dir.source
                    .reported
                    .get_or_insert_with(|| file.status().clone());
                false
            }
            None => true,
        });

        for child in self.dirs.values_mut() {
            child.finalize(policy);
        }

        let status = match &self.source.reported {
            Some(reported) => reported.clone(),
            None if self.dirs.is_empty() && self.files.is_empty() => return,
            None => {
                let mut statuses = self
                    .dirs
                    .values()
                    .map(|dir| dir.entry.status())
                    .chain(self.files.iter().map(Entry::status));
                policy.aggregate(&mut statuses)
            }
        };
        self.entry.set_status(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Related, Relation};
    use crate::policy::TagPolicy;

    fn file_names(dir: &FileDir<Detached>) -> Vec<&str> {
        dir.child_files().iter().map(Entry::name).collect()
    }

    #[test]
    fn test_add_file_creates_intermediate_dirs() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("a/b/c.txt", "M"));

        let a = &root.dirs["a"];
        let b = &a.dirs["b"];
        assert!(a.is_populated());
        assert_eq!(b.path(), Path::new("a/b"));
        assert_eq!(file_names(b), vec!["c.txt"]);
        assert!(b.last_digest().is_none());
    }

    #[test]
    fn test_finalize_sorts_files() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("z.txt", "M"));
        root.add_file(Change::new("a.txt", "A"));
        root.add_file(Change::new("m.txt", "R"));
        root.finalize(&TagPolicy::default());

        assert_eq!(file_names(&root), vec!["a.txt", "m.txt", "z.txt"]);
    }

    #[test]
    fn test_repeated_path_replaces_entry() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("a.txt", "A"));
        root.add_file(
            Change::new("a.txt", "M").with_related(Related::new("b.txt", Relation::CopiedFrom)),
        );
        root.add_file(Change::new("0.txt", "C"));
        root.finalize(&TagPolicy::default());

        assert_eq!(file_names(&root), vec!["0.txt", "a.txt"]);
        assert_eq!(root.child_files()[1].status(), &Status::new("M"));
        assert!(root.child_files()[1].related().is_some());
    }

    #[test]
    fn test_finalize_aggregates_bottom_up() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("docs/readme", "C"));
        root.add_file(Change::new("src/deep/lib.rs", "M"));
        root.add_file(Change::new("src/main.rs", "C"));
        root.finalize(&TagPolicy::default());

        assert_eq!(root.dirs["docs"].entry().status(), &Status::new("C"));
        assert_eq!(root.dirs["src"].dirs["deep"].entry().status(), &Status::new("M"));
        assert_eq!(root.dirs["src"].entry().status(), &Status::new("M"));
        assert_eq!(root.entry().status(), &Status::new("M"));
    }

    #[test]
    fn test_directory_status_line() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("new/", "?"));
        root.add_file(Change::new("a.txt", "C"));
        root.finalize(&TagPolicy::default());

        assert_eq!(root.dirs["new"].entry().status(), &Status::new("?"));
        assert!(file_names(&root.dirs["new"]).is_empty());
        assert_eq!(root.entry().status(), &Status::new("?"));
    }

    #[test]
    fn test_detached_nodes_never_repopulate() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("a.txt", "M"));

        assert!(!root.invalidate());
        assert_eq!(file_names(&root), vec!["a.txt"]);
        assert!(root.is_current());
    }

    #[test]
    fn test_file_line_for_directory_sets_its_status() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("x", "R"));
        root.add_file(Change::new("x/y", "C"));
        root.finalize(&TagPolicy::default());

        let dir_names: Vec<&str> = root.child_dirs().map(|dir| dir.entry().name()).collect();
        assert_eq!(dir_names, vec!["x"]);
        assert!(file_names(&root).is_empty());
        assert_eq!(root.dirs["x"].entry().status(), &Status::new("R"));
        assert_eq!(file_names(&root.dirs["x"]), vec!["y"]);
    }

    #[test]
    fn test_directory_line_wins_over_file_line_and_contents() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        root.add_file(Change::new("x/", "?"));
        root.add_file(Change::new("x", "R"));
        root.add_file(Change::new("x/y", "M"));
        root.finalize(&TagPolicy::default());

        assert_eq!(root.dirs["x"].entry().status(), &Status::new("?"));
        assert!(file_names(&root).is_empty());
        assert_eq!(root.entry().status(), &Status::new("?"));
    }

    #[test]
    fn test_invalid_paths_are_ignored() {
        let mut root = FileDir::synthetic("", PathBuf::new());
        for path in ["a//b.txt", "../x", "/etc/x", "a/./c", "a/.."] {
            root.add_file(Change::new(path, "M"));
        }
        root.add_file(Change::new("a/ok.txt", "A"));
        root.finalize(&TagPolicy::default());

        let a = &root.dirs["a"];
        assert_eq!(root.dirs.len(), 1);
        assert!(a.child_dirs().next().is_none());
        assert_eq!(file_names(a), vec!["ok.txt"]);
    }
}
