//! A lazy, hierarchical file database with per-entry statuses.
//!
//! A [`FileDb`] mirrors a directory tree. Directories are listed only when a
//! query reaches them, and each listed directory remembers a digest of its
//! entry names so the database can tell whether it still matches the disk.
//!
//! Three flavors share the same tree:
//!
//! - [`OsFileDb`] lists the filesystem as is, optionally with a
//!   [`StatusPolicy`] giving every entry the same on-disk status.
//! - [`SnapshotFileDb`] overlays a parsed status report on the filesystem.
//!   Paths only found in the report (e.g. deleted files) are listed too.
//! - [`ChangeFileDb`] is built from a status report alone.
//!
//! Statuses are opaque tags; the policy decides which are clean, ignored or
//! significant, and how a directory's status follows from its contents.

mod changes;
mod database;
mod dir_list;
mod entry;
mod file_dir;
mod policy;
mod report;
mod snapshot;
mod source;
mod util;

pub use changes::Detached;
pub use database::{ChangeFileDb, DbError, DirView, FileDb, OsFileDb, SnapshotFileDb};
pub use dir_list::{DirListError, Listing, list_directory, list_or_empty};
pub use entry::{Change, Entry, Related, Relation, Status};
pub use file_dir::{ChildSource, FileDir, OsChildren, Population};
pub use policy::{AggregateRule, Classification, PlainPolicy, PolicyError, StatusPolicy, TagPolicy};
pub use report::{ParseError, parse_listing};
pub use snapshot::Snapshot;
pub use source::{SourceError, StatusSource, TextSource};
pub use util::hashing::{Digest, DigestBuilder};
