//! Non-recursive directory listing.
//!
//! A listing only records entry names, split into subdirectories and
//! everything else. Symlinks are never followed, so a symlink to a directory
//! is listed with the files. The digest of a listing is what a tree node
//! remembers to notice entries being added, removed or renamed.

use crate::util::hashing::{Digest, DigestBuilder};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum DirListError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("No such directory: {0}")]
    NotFound(PathBuf),
}

impl DirListError {
    fn from_io(e: std::io::Error, path: &Path) -> Self {
        match e.kind() {
            ErrorKind::PermissionDenied => DirListError::PermissionDenied(path.to_path_buf()),
            ErrorKind::NotFound => DirListError::NotFound(path.to_path_buf()),
            _ => DirListError::Io(e),
        }
    }
}

/// The immediate children of one directory, each group sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl Listing {
    /// Hashes every entry name.
    ///
    /// Names are hashed in sorted order so the digest does not depend on the
    /// order the OS returned them in.
    pub fn digest(&self) -> Digest {
        let mut names: Vec<&str> = self
            .dirs
            .iter()
            .chain(&self.files)
            .map(String::as_str)
            .collect();
        names.sort_unstable();

        let mut builder = DigestBuilder::new();
        for name in names {
            builder.update_field(name.as_bytes());
        }
        builder.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

pub fn list_directory(dir: &Path) -> Result<Listing, DirListError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| DirListError::from_io(e, dir))?;

    let mut listing = Listing::default();

    for entry in read_dir {
        let entry = entry.map_err(|e| DirListError::from_io(e, dir))?;

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!(
                    "Non UTF-8 name in {}: {}",
                    dir.display(),
                    raw.to_string_lossy()
                );
                raw.to_string_lossy().into_owned()
            }
        };

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                // Removed between readdir and stat.
                debug!("Skipping {} in {}: {}", name, dir.display(), e);
                continue;
            }
        };

        if file_type.is_dir() {
            listing.dirs.push(name);
        } else {
            listing.files.push(name);
        }
    }

    listing.dirs.sort();
    listing.files.sort();

    Ok(listing)
}

/// Lists `dir`, treating any failure as an empty directory.
///
/// A directory that vanished is expected (its parent was listed earlier);
/// other failures are logged.
pub fn list_or_empty(dir: &Path) -> Listing {
    match list_directory(dir) {
        Ok(listing) => listing,
        Err(DirListError::NotFound(_)) => {
            debug!("{} does not exist, listing as empty", dir.display());
            Listing::default()
        }
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            Listing::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_splits_dirs_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/inner.txt"), "inner").unwrap();

        let listing = list_directory(root).unwrap();

        assert_eq!(listing.dirs, vec!["sub"]);
        assert_eq!(listing.files, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_list_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let listing = list_directory(temp_dir.path()).unwrap();

        assert!(listing.is_empty());
    }

    #[test]
    fn test_list_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");

        let result = list_directory(&missing);
        assert!(matches!(result, Err(DirListError::NotFound(_))));

        assert!(list_or_empty(&missing).is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_to_directory_is_listed_as_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

        let listing = list_directory(root).unwrap();

        assert_eq!(listing.dirs, vec!["real"]);
        assert_eq!(listing.files, vec!["link"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let restricted_dir = temp_dir.path().join("restricted");
        fs::create_dir(&restricted_dir).unwrap();

        let mut perms = fs::metadata(&restricted_dir).unwrap().permissions();
        perms.set_mode(0o000);
        fs::set_permissions(&restricted_dir, perms.clone()).unwrap();

        let result = list_directory(&restricted_dir);
        let fallback = list_or_empty(&restricted_dir);

        perms.set_mode(0o755);
        fs::set_permissions(&restricted_dir, perms).unwrap();

        // Root can read anything; only check the error when access was refused.
        if let Err(e) = result {
            assert!(matches!(e, DirListError::PermissionDenied(_)));
            assert!(fallback.is_empty());
        }
    }

    #[test]
    fn test_digest_ignores_listing_order() {
        let one = Listing {
            dirs: vec!["sub".to_string()],
            files: vec!["a.txt".to_string(), "b.txt".to_string()],
        };
        let two = Listing {
            dirs: vec!["sub".to_string()],
            files: vec!["b.txt".to_string(), "a.txt".to_string()],
        };

        assert_eq!(one.digest(), two.digest());
    }

    #[test]
    fn test_digest_detects_added_and_renamed_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "a").unwrap();
        let before = list_directory(root).unwrap().digest();

        fs::write(root.join("a.txt"), "changed content").unwrap();
        assert_eq!(list_directory(root).unwrap().digest(), before);

        fs::rename(root.join("a.txt"), root.join("c.txt")).unwrap();
        let renamed = list_directory(root).unwrap().digest();
        assert_ne!(renamed, before);

        fs::write(root.join("d.txt"), "d").unwrap();
        assert_ne!(list_directory(root).unwrap().digest(), renamed);
    }
}
