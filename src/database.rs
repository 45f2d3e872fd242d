use crate::changes::Detached;
use crate::entry::{Entry, Status};
use crate::file_dir::{ChildSource, FileDir, OsChildren};
use crate::policy::{PlainPolicy, StatusPolicy};
use crate::report::ParseError;
use crate::snapshot::Snapshot;
use crate::source::{SourceError, StatusSource};
use crate::util::hashing::{Digest, DigestBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Status source error: {0}")]
    Source(#[from] SourceError),
    #[error("Status report parse error: {0}")]
    Parse(#[from] ParseError),
}

/// A plain filesystem tree, optionally filtered by a policy.
pub type OsFileDb = FileDb<OsChildren>;

/// A filesystem tree overlaid with a parsed status report.
pub type SnapshotFileDb = FileDb<Snapshot>;

/// A tree built only from a status report, with no filesystem behind it.
pub type ChangeFileDb = FileDb<Detached>;

/// A lazily populated, status-annotated cache of one directory tree.
///
/// A database is built for one view and thrown away once
/// [`is_current`](FileDb::is_current) says it is stale. Directories are only
/// listed when a query needs them, so the query methods take `&mut self`.
pub struct FileDb<S> {
    root: FileDir<S>,
    policy: Box<dyn StatusPolicy>,
    source: Option<Box<dyn StatusSource>>,
    status_digest: Option<Digest>,
}

fn root_name(base: &Path) -> String {
    base.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.display().to_string())
}

/// Reads and hashes the raw report. Parsing is left to the caller.
fn read_report(source: &dyn StatusSource) -> Result<(String, Digest), SourceError> {
    let mut hasher = DigestBuilder::new();
    let text = source.status_text(&mut hasher)?;
    Ok((text, hasher.finish()))
}

impl FileDb<OsChildren> {
    /// A tree of `base` with no statuses at all.
    pub fn os(base: impl Into<PathBuf>) -> Self {
        Self::workspace(base, PlainPolicy)
    }

    /// A tree of `base` whose entries take the policy's on-disk status and
    /// are filtered by it.
    pub fn workspace(base: impl Into<PathBuf>, policy: impl StatusPolicy + 'static) -> Self {
        let base = base.into();
        let entry = Entry::new(root_name(&base), policy.on_disk_default());

        FileDb {
            root: FileDir::new(entry, base, OsChildren),
            policy: Box::new(policy),
            source: None,
            status_digest: None,
        }
    }
}

impl FileDb<Snapshot> {
    /// A tree of `base` with statuses from the report `source` provides.
    ///
    /// Entries only present in the report (deleted files, and the
    /// directories holding them) are part of the tree as well.
    pub fn with_snapshot(
        base: impl Into<PathBuf>,
        policy: impl StatusPolicy + 'static,
        source: impl StatusSource + 'static,
    ) -> Result<Self, DbError> {
        let base = base.into();
        let (text, digest) = read_report(&source)?;
        let snapshot = source.parse_snapshot(&text)?;

        info!(
            "Loaded status report with {} entries ({})",
            snapshot.len(),
            digest
        );

        let status = if snapshot.is_empty() {
            policy.on_disk_default()
        } else {
            policy.aggregate(&mut snapshot.statuses())
        };
        let entry = Entry::new(root_name(&base), status);

        Ok(FileDb {
            root: FileDir::new(entry, base, snapshot),
            policy: Box::new(policy),
            source: Some(Box::new(source)),
            status_digest: Some(digest),
        })
    }
}

impl FileDb<Detached> {
    /// A tree holding exactly the paths of the report `source` provides.
    pub fn from_changes(
        policy: impl StatusPolicy + 'static,
        source: impl StatusSource + 'static,
    ) -> Result<Self, DbError> {
        let (text, digest) = read_report(&source)?;
        let changes = source.parse_changes(&text)?;

        info!(
            "Loaded change list with {} entries ({})",
            changes.len(),
            digest
        );

        let mut root = FileDir::synthetic("", PathBuf::new());
        for change in changes {
            root.add_file(change);
        }
        root.finalize(&policy);

        Ok(FileDb {
            root,
            policy: Box::new(policy),
            source: Some(Box::new(source)),
            status_digest: Some(digest),
        })
    }
}

impl<S: ChildSource> FileDb<S> {
    /// Whether the status report and every directory listed so far are
    /// unchanged. A stale database should be rebuilt.
    pub fn is_current(&self) -> bool {
        if let (Some(source), Some(expected)) = (&self.source, self.status_digest) {
            match read_report(source.as_ref()) {
                Ok((_, digest)) if digest == expected => {}
                Ok(_) => {
                    debug!("Status report changed");
                    return false;
                }
                Err(e) => {
                    warn!("Cannot re-read status report: {}", e);
                    return false;
                }
            }
        }

        self.root.is_current()
    }

    /// Visible subdirectories and files of the directory at `path`, or
    /// `None` if there is no such directory.
    ///
    /// `path` is relative to the root and `/`-separated; `""` is the root.
    pub fn dir_contents(
        &mut self,
        path: &str,
        show_hidden: bool,
        hide_clean: bool,
    ) -> Option<(
        impl Iterator<Item = &Entry> + '_,
        impl Iterator<Item = &Entry> + '_,
    )> {
        let policy: &dyn StatusPolicy = self.policy.as_ref();
        let dir = self.root.find_dir_mut(path, policy)?;
        Some(dir.dirs_and_files(policy, show_hidden, hide_clean))
    }

    /// The directory at `path`, populated.
    pub fn find_dir(&mut self, path: &str) -> Option<DirView<'_, S>> {
        let policy: &dyn StatusPolicy = self.policy.as_ref();
        let dir = self.root.find_dir_mut(path, policy)?;
        Some(DirView { dir, policy })
    }

    /// The file entry at `path`, whether or not the policy would show it.
    pub fn find_file(&mut self, path: &str) -> Option<&Entry> {
        let path = path.trim_end_matches('/');
        let (dir_path, name) = path.rsplit_once('/').unwrap_or(("", path));
        if name.is_empty() {
            return None;
        }

        let policy: &dyn StatusPolicy = self.policy.as_ref();
        self.root.find_dir_mut(dir_path, policy)?.find_file(name)
    }

    /// Discards the cached children of the directory at `path` so the next
    /// read lists it again.
    ///
    /// Returns `false` when nothing was cached there, or when the tree cannot
    /// be repopulated.
    pub fn invalidate_dir(&mut self, path: &str) -> bool {
        self.root
            .cached_dir_mut(path)
            .is_some_and(FileDir::invalidate)
    }

    pub fn root(&self) -> &FileDir<S> {
        &self.root
    }

    pub fn root_status(&self) -> &Status {
        self.root.entry().status()
    }

    pub fn base_dir(&self) -> &Path {
        self.root.path()
    }

    pub fn policy(&self) -> &dyn StatusPolicy {
        self.policy.as_ref()
    }

    /// Digest of the status report the database was built from.
    pub fn status_digest(&self) -> Option<Digest> {
        self.status_digest
    }
}

/// A directory found in a [`FileDb`], together with the database's policy.
pub struct DirView<'a, S> {
    dir: &'a mut FileDir<S>,
    policy: &'a dyn StatusPolicy,
}

impl<'a, S: ChildSource> DirView<'a, S> {
    pub fn entry(&self) -> &Entry {
        self.dir.entry()
    }

    pub fn name(&self) -> &str {
        self.dir.entry().name()
    }

    pub fn status(&self) -> &Status {
        self.dir.entry().status()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn is_populated(&self) -> bool {
        self.dir.is_populated()
    }

    pub fn last_digest(&self) -> Option<Digest> {
        self.dir.last_digest()
    }

    pub fn is_current(&self) -> bool {
        self.dir.is_current()
    }

    pub fn dir(&self) -> &FileDir<S> {
        &*self.dir
    }

    pub fn dirs_and_files(
        &mut self,
        show_hidden: bool,
        hide_clean: bool,
    ) -> (
        impl Iterator<Item = &Entry> + '_,
        impl Iterator<Item = &Entry> + '_,
    ) {
        self.dir.dirs_and_files(self.policy, show_hidden, hide_clean)
    }

    /// Like [`dirs_and_files`](Self::dirs_and_files), keeping the borrow of
    /// the database.
    pub fn into_dirs_and_files(
        self,
        show_hidden: bool,
        hide_clean: bool,
    ) -> (
        impl Iterator<Item = &'a Entry> + 'a,
        impl Iterator<Item = &'a Entry> + 'a,
    ) {
        let DirView { dir, policy } = self;
        dir.dirs_and_files(policy, show_hidden, hide_clean)
    }

    pub fn find_file(&self, name: &str) -> Option<&Entry> {
        self.dir.find_file(name)
    }
}

#[cfg(test)]
mod tests;
