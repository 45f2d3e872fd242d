//! Immutable path -> status views parsed from one status report.
//!
//! Items are kept sorted by path in one shared slice. Every path under a
//! directory `d` starts with `d/`, and strings sharing a prefix are contiguous
//! in sorted order, so the part of a snapshot under a subdirectory is a
//! sub-range found by binary search. Narrowing never copies items; each tree
//! node narrows the view its parent was given.

use crate::dir_list::{self, Listing};
use crate::entry::{Change, Entry, Related, Status};
use crate::file_dir::{ChildSource, Population};
use crate::policy::StatusPolicy;
use crate::report::is_valid_path;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
struct SnapshotItem {
    path: String,
    status: Status,
    related: Option<Related>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    items: Arc<[SnapshotItem]>,
    range: Range<usize>,
    /// Empty at the root, otherwise the narrowed directory plus `/`.
    prefix: String,
}

impl Snapshot {
    /// Builds a snapshot; when a path is reported twice the later line wins.
    ///
    /// Paths with empty, `.` or `..` segments, or a leading `/`, are dropped.
    pub fn new(changes: impl IntoIterator<Item = Change>) -> Self {
        let mut items: Vec<SnapshotItem> = changes
            .into_iter()
            .filter(|change| {
                let valid = is_valid_path(&change.path);
                if !valid {
                    warn!("Ignoring status for invalid path {:?}", change.path);
                }
                valid
            })
            .map(|change| SnapshotItem {
                path: change.path,
                status: change.status,
                related: change.related,
            })
            .collect();
        // Stable, so duplicates stay in report order.
        items.sort_by(|a, b| a.path.cmp(&b.path));

        let mut deduped: Vec<SnapshotItem> = Vec::with_capacity(items.len());
        for item in items {
            match deduped.last_mut() {
                Some(last) if last.path == item.path => *last = item,
                _ => deduped.push(item),
            }
        }

        let len = deduped.len();
        Snapshot {
            items: deduped.into(),
            range: 0..len,
            prefix: String::new(),
        }
    }

    pub fn empty() -> Self {
        Snapshot::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The directory this view is narrowed to, `""` for the whole report.
    pub fn dir_path(&self) -> &str {
        self.prefix.strip_suffix('/').unwrap_or(&self.prefix)
    }

    /// Whether both views narrow the same parsed report.
    pub fn shares_items_with(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    /// A view of the paths under `dir_path`, relative to this view.
    pub fn narrowed_for_subdir(&self, dir_path: &str) -> Snapshot {
        let dir_path = dir_path.trim_matches('/');
        if dir_path.is_empty() {
            return self.clone();
        }

        let prefix = format!("{}{}/", self.prefix, dir_path);
        let range = self.subrange(&prefix);
        Snapshot {
            items: Arc::clone(&self.items),
            range,
            prefix,
        }
    }

    fn subrange(&self, prefix: &str) -> Range<usize> {
        let view = &self.items[self.range.clone()];
        let start = view.partition_point(|item| item.path.as_str() < prefix);
        let end = view
            .partition_point(|item| item.path.as_str() < prefix || item.path.starts_with(prefix));
        self.range.start + start..self.range.start + end
    }

    fn relative<'a>(&self, item: &'a SnapshotItem) -> &'a str {
        &item.path[self.prefix.len()..]
    }

    /// `(relative path, status, related)` in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Status, Option<&Related>)> {
        self.items[self.range.clone()]
            .iter()
            .map(|item| (self.relative(item), &item.status, item.related.as_ref()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(path, _, _)| path)
    }

    pub fn statuses(&self) -> impl Iterator<Item = &Status> {
        self.items[self.range.clone()]
            .iter()
            .map(|item| &item.status)
    }

    /// Looks up a path relative to this view.
    pub fn get(&self, path: &str) -> Option<(&Status, Option<&Related>)> {
        let full = format!("{}{}", self.prefix, path);
        let view = &self.items[self.range.clone()];
        view.binary_search_by(|item| item.path.as_str().cmp(&full))
            .ok()
            .map(|index| (&view[index].status, view[index].related.as_ref()))
    }
}

impl ChildSource for Snapshot {
    /// Merges the on-disk listing of `dir` with this view.
    ///
    /// Report data wins over the on-disk default. Paths with a further `/`
    /// only make sure their top directory exists; the whole range under it
    /// is skipped and left to that child's own population. A name that is a
    /// directory stays one; a plain line for it only gives its status.
    fn populate(&self, dir: &Path, policy: &dyn StatusPolicy) -> Population<Self> {
        let listing = dir_list::list_or_empty(dir);
        let digest = listing.digest();
        let Listing {
            dirs: disk_dirs,
            files: disk_files,
        } = listing;
        let on_disk = policy.on_disk_default();

        let mut files: BTreeMap<String, Entry> = disk_files
            .into_iter()
            .map(|name| (name.clone(), Entry::new(name, on_disk.clone())))
            .collect();
        // Directory name -> status reported for the directory itself.
        let mut dirs: BTreeMap<String, Option<Status>> =
            disk_dirs.into_iter().map(|name| (name, None)).collect();

        let mut index = self.range.start;
        while index < self.range.end {
            let item = &self.items[index];
            let path = self.relative(item);
            match path.split_once('/') {
                Some((name, "")) => {
                    dirs.insert(name.to_string(), Some(item.status.clone()));
                    index += 1;
                }
                Some((name, _)) => {
                    dirs.entry(name.to_string()).or_default();
                    index = self.subrange(&format!("{}{}/", self.prefix, name)).end;
                }
                // This directory's own line, consumed by the parent.
                None if path.is_empty() => index += 1,
                None => {
                    files.insert(
                        path.to_string(),
                        Entry::with_related(path, item.status.clone(), item.related.clone()),
                    );
                    index += 1;
                }
            }
        }

        for (name, reported) in dirs.iter_mut() {
            if let Some(file) = files.remove(name)
                && reported.is_none()
            {
                *reported = Some(file.status().clone());
            }
        }

        let dirs = dirs
            .into_iter()
            .map(|(name, reported)| {
                let child = self.narrowed_for_subdir(&name);
                let status = reported.unwrap_or_else(|| {
                    if child.is_empty() {
                        on_disk.clone()
                    } else {
                        policy.aggregate(&mut child.statuses())
                    }
                });
                (Entry::new(name, status), child)
            })
            .collect();

        Population {
            digest: Some(digest),
            dirs,
            files: files.into_values().collect(),
        }
    }
}
