use super::*;
use crate::entry::{Change, Related, Relation};
use crate::policy::TagPolicy;
use crate::source::TextSource;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A source handing out a fixed list of changes, for statuses the listing
/// grammar has no code for.
struct ChangeList(Vec<Change>);

impl StatusSource for ChangeList {
    fn status_text(&self, hasher: &mut DigestBuilder) -> Result<String, SourceError> {
        let text: String = self
            .0
            .iter()
            .map(|change| format!("{} {}\n", change.status, change.path))
            .collect();
        hasher.update(text.as_bytes());
        Ok(text)
    }

    fn parse_changes(&self, _text: &str) -> Result<Vec<Change>, ParseError> {
        Ok(self.0.clone())
    }
}

fn word_policy() -> TagPolicy {
    TagPolicy::from_toml(
        r#"
        significant = ["modified", "added", "deleted"]
        clean = ["clean"]
        ignored = []
        on_disk_default = "untracked"

        [aggregate]
        precedence = ["modified", "added", "deleted"]
        default = "clean"
        "#,
    )
    .unwrap()
}

fn write_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, file.as_bytes()).unwrap();
    }
}

fn names<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<String> {
    entries.map(|entry| entry.name().to_string()).collect()
}

fn tagged<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<(String, String)> {
    entries
        .map(|entry| (entry.name().to_string(), entry.status().to_string()))
        .collect()
}

fn contents<S: ChildSource>(
    db: &mut FileDb<S>,
    path: &str,
    show_hidden: bool,
    hide_clean: bool,
) -> (Vec<String>, Vec<String>) {
    let (dirs, files) = db.dir_contents(path, show_hidden, hide_clean).unwrap();
    (names(dirs), names(files))
}
