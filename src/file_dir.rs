//! The lazily populated directory node.
//!
//! A [`FileDir`] mirrors one directory. Its children are materialized the
//! first time a read needs them, by the node's [`ChildSource`]: a plain
//! filesystem listing ([`OsChildren`]), a listing merged with a status
//! report ([`Snapshot`](crate::Snapshot)), or nothing at all for trees built
//! up front ([`Detached`](crate::Detached)).
//!
//! Once populated, a node remembers the digest of the listing it was built
//! from. Staleness is checked on demand by comparing that digest with a fresh
//! one, descending only into children that were themselves populated: a
//! subtree nobody looked at cannot be stale.

use crate::dir_list::{self, Listing};
use crate::entry::Entry;
use crate::policy::StatusPolicy;
use crate::util::hashing::Digest;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the children of a node when it is populated.
pub trait ChildSource: Sized {
    /// Whether discarding a node's children and populating it again yields
    /// them back. Trees built in memory cannot be repopulated.
    const REPOPULATES: bool = true;

    /// Materializes the children of the directory at `dir`.
    fn populate(&self, dir: &Path, policy: &dyn StatusPolicy) -> Population<Self>;

    /// Digest of what backs `dir` right now, `None` when nothing does.
    fn current_digest(&self, dir: &Path) -> Option<Digest> {
        Some(dir_list::list_or_empty(dir).digest())
    }
}

/// The result of populating one node. Order does not matter, the node sorts.
pub struct Population<S> {
    pub digest: Option<Digest>,
    pub dirs: Vec<(Entry, S)>,
    pub files: Vec<Entry>,
}

impl<S> Default for Population<S> {
    fn default() -> Self {
        Population {
            digest: None,
            dirs: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// Children straight from the filesystem. Every entry gets the policy's
/// on-disk status.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsChildren;

impl ChildSource for OsChildren {
    fn populate(&self, dir: &Path, policy: &dyn StatusPolicy) -> Population<Self> {
        let listing = dir_list::list_or_empty(dir);
        let digest = listing.digest();
        let Listing { dirs, files } = listing;
        let status = policy.on_disk_default();

        Population {
            digest: Some(digest),
            dirs: dirs
                .into_iter()
                .map(|name| (Entry::new(name, status.clone()), OsChildren))
                .collect(),
            files: files
                .into_iter()
                .map(|name| Entry::new(name, status.clone()))
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct FileDir<S> {
    pub(crate) entry: Entry,
    pub(crate) path: PathBuf,
    pub(crate) source: S,
    pub(crate) populated: bool,
    pub(crate) dirs: BTreeMap<String, FileDir<S>>,
    pub(crate) files: Vec<Entry>,
    pub(crate) last_digest: Option<Digest>,
}

impl<S: ChildSource> FileDir<S> {
    pub(crate) fn new(entry: Entry, path: PathBuf, source: S) -> Self {
        FileDir {
            entry,
            path,
            source,
            populated: false,
            dirs: BTreeMap::new(),
            files: Vec::new(),
            last_digest: None,
        }
    }

    /// The directory's own record: its name and status.
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Digest of the listing the node was last populated from.
    pub fn last_digest(&self) -> Option<Digest> {
        self.last_digest
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Child directories as currently cached, without populating.
    pub fn child_dirs(&self) -> impl Iterator<Item = &FileDir<S>> {
        self.dirs.values()
    }

    /// File entries as currently cached, without populating.
    pub fn child_files(&self) -> &[Entry] {
        &self.files
    }

    pub(crate) fn ensure_populated(&mut self, policy: &dyn StatusPolicy) {
        if !self.populated {
            self.populate(policy);
        }
    }

    fn populate(&mut self, policy: &dyn StatusPolicy) {
        let Population {
            digest,
            dirs,
            mut files,
        } = self.source.populate(&self.path, policy);

        self.dirs = dirs
            .into_iter()
            .map(|(entry, source)| {
                let path = self.path.join(entry.name());
                (entry.name().to_string(), FileDir::new(entry, path, source))
            })
            .collect();

        files.sort_by(|a, b| a.name().cmp(b.name()));
        files.dedup_by(|later, earlier| later.name() == earlier.name());
        self.files = files;

        self.last_digest = digest;
        self.populated = true;

        debug!(
            "Populated {} ({} dirs, {} files)",
            self.path.display(),
            self.dirs.len(),
            self.files.len()
        );
    }

    /// Visible child directories and files, each sorted by name.
    ///
    /// Populates the node first if needed, so this may list the directory.
    pub fn dirs_and_files<'a>(
        &'a mut self,
        policy: &'a dyn StatusPolicy,
        show_hidden: bool,
        hide_clean: bool,
    ) -> (
        impl Iterator<Item = &'a Entry> + 'a,
        impl Iterator<Item = &'a Entry> + 'a,
    ) {
        self.ensure_populated(policy);
        let this: &'a Self = self;

        let dirs = this
            .dirs
            .values()
            .map(|dir| &dir.entry)
            .filter(move |entry| policy.is_visible(entry, show_hidden, hide_clean));
        let files = this
            .files
            .iter()
            .filter(move |entry| policy.is_visible(entry, show_hidden, hide_clean));

        (dirs, files)
    }

    /// Whether nothing this node has seen changed on disk.
    ///
    /// Never populates. Unpopulated children are trusted.
    pub fn is_current(&self) -> bool {
        if let Some(last) = self.last_digest {
            let current = self.source.current_digest(&self.path);
            if current != Some(last) {
                debug!("{} changed on disk", self.path.display());
                return false;
            }
        }

        !self.populated
            || self
                .dirs
                .values()
                .filter(|dir| dir.populated)
                .all(FileDir::is_current)
    }

    /// Starts a new epoch: drops the children so the next read repopulates.
    ///
    /// The last digest is kept, so an invalidated node still reports whether
    /// its directory changed since it was last listed.
    pub(crate) fn invalidate(&mut self) -> bool {
        if !S::REPOPULATES || !self.populated {
            return false;
        }
        self.dirs.clear();
        self.files.clear();
        self.populated = false;
        true
    }

    /// Descends to the directory at `path`, populating every node entered.
    ///
    /// A `..` segment never leaves a node, so such paths are not found.
    pub(crate) fn find_dir_mut(
        &mut self,
        path: &str,
        policy: &dyn StatusPolicy,
    ) -> Option<&mut FileDir<S>> {
        let mut node = self;
        node.ensure_populated(policy);
        for segment in split_path(path) {
            if segment == ".." {
                return None;
            }
            node = node.dirs.get_mut(segment)?;
            node.ensure_populated(policy);
        }
        Some(node)
    }

    /// Like [`find_dir_mut`](Self::find_dir_mut) but only through nodes that
    /// are already populated.
    pub(crate) fn cached_dir_mut(&mut self, path: &str) -> Option<&mut FileDir<S>> {
        let mut node = self;
        for segment in split_path(path) {
            if !node.populated || segment == ".." {
                return None;
            }
            node = node.dirs.get_mut(segment)?;
        }
        Some(node)
    }

    pub(crate) fn find_file(&self, name: &str) -> Option<&Entry> {
        self.files.iter().find(|entry| entry.name() == name)
    }
}

/// Path segments, skipping empty and `.` components.
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Status;
    use crate::policy::{PlainPolicy, TagPolicy};
    use std::fs;
    use tempfile::TempDir;

    fn os_root(path: &Path) -> FileDir<OsChildren> {
        FileDir::new(Entry::new("root", Status::unknown()), path.to_path_buf(), OsChildren)
    }

    fn names<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<&'a str> {
        entries.map(Entry::name).collect()
    }

    #[test]
    fn test_not_populated_until_read() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let mut root = os_root(temp.path());
        assert!(!root.is_populated());
        assert!(root.child_files().is_empty());
        assert!(root.last_digest().is_none());

        let (_, files) = root.dirs_and_files(&PlainPolicy, false, false);
        assert_eq!(names(files), vec!["a.txt"]);
        assert!(root.is_populated());
        assert!(root.last_digest().is_some());
    }

    #[test]
    fn test_children_start_unpopulated() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();

        let mut root = os_root(temp.path());
        let _ = root.dirs_and_files(&PlainPolicy, false, false);

        let sub = root.child_dirs().next().unwrap();
        assert_eq!(sub.entry().name(), "sub");
        assert_eq!(sub.path(), temp.path().join("sub"));
        assert!(!sub.is_populated());
    }

    #[test]
    fn test_find_dir_populates_path() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();
        fs::create_dir(temp.path().join("x")).unwrap();

        let mut root = os_root(temp.path());
        let found = root.find_dir_mut("a/./b/", &PlainPolicy).unwrap();
        assert_eq!(found.entry().name(), "b");
        assert!(found.is_populated());

        let a = root.dirs.get("a").unwrap();
        assert!(a.is_populated());
        assert!(!root.dirs.get("x").unwrap().is_populated());
        assert!(!a.dirs["b"].dirs["c"].is_populated());
    }

    #[test]
    fn test_find_dir_never_climbs_out() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("tree/a")).unwrap();
        fs::create_dir(temp.path().join("outside")).unwrap();

        let mut root = os_root(&temp.path().join("tree"));

        assert!(root.find_dir_mut("..", &PlainPolicy).is_none());
        assert!(root.find_dir_mut("a/..", &PlainPolicy).is_none());
        assert!(root.find_dir_mut("../outside", &PlainPolicy).is_none());
        assert!(root.cached_dir_mut("a/..").is_none());
        assert!(root.find_dir_mut("a", &PlainPolicy).is_some());
    }

    #[test]
    fn test_find_dir_missing_segment() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();

        let mut root = os_root(temp.path());

        assert!(root.find_dir_mut("a/missing", &PlainPolicy).is_none());
        assert!(root.find_dir_mut("", &PlainPolicy).is_some());
    }

    #[test]
    fn test_filtering_happens_at_read_time() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".hidden"), "h").unwrap();
        fs::write(temp.path().join("shown"), "s").unwrap();

        let mut root = os_root(temp.path());

        let (_, files) = root.dirs_and_files(&PlainPolicy, false, false);
        assert_eq!(names(files), vec!["shown"]);

        let digest = root.last_digest();
        let (_, files) = root.dirs_and_files(&PlainPolicy, true, false);
        assert_eq!(names(files), vec![".hidden", "shown"]);
        assert_eq!(root.last_digest(), digest);
    }

    #[test]
    fn test_on_disk_default_status() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let mut root = os_root(temp.path());
        let policy = TagPolicy::default();
        let (dirs, files) = root.dirs_and_files(&policy, false, false);

        let dirs: Vec<&Entry> = dirs.collect();
        let files: Vec<&Entry> = files.collect();
        assert_eq!(dirs[0].status(), &Status::new("?"));
        assert_eq!(files[0].status(), &Status::new("?"));
    }

    #[test]
    fn test_invalidate_keeps_digest_and_repopulates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let mut root = os_root(temp.path());
        let _ = root.dirs_and_files(&PlainPolicy, false, false);
        let digest = root.last_digest();

        assert!(root.invalidate());
        assert!(!root.is_populated());
        assert_eq!(root.last_digest(), digest);
        assert!(root.is_current());

        fs::write(temp.path().join("b.txt"), "b").unwrap();
        assert!(!root.is_current());

        let (_, files) = root.dirs_and_files(&PlainPolicy, false, false);
        assert_eq!(names(files), vec!["a.txt", "b.txt"]);
        assert!(root.is_current());
    }

    #[test]
    fn test_split_path() {
        let segments: Vec<&str> = split_path("./a//b/./c/").collect();
        assert_eq!(segments, vec!["a", "b", "c"]);
        assert_eq!(split_path("").count(), 0);
        assert_eq!(split_path(".").count(), 0);
    }
}
