use fsdb::{ChildSource, Entry, FileDb};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub show_hidden: bool,
    pub hide_clean: bool,
    pub recursive: bool,
}

/// One output line: status code column, indent, name.
pub fn format_entry(entry: &Entry, depth: usize, is_dir: bool) -> String {
    let code = entry.status().to_string();
    let mut line = format!("{code:<2} {}{}", "  ".repeat(depth), entry.name());
    if is_dir {
        line.push('/');
    }
    if let Some(related) = entry.related() {
        line.push_str(&format!(" ({} {})", related.relation, related.path));
    }
    line
}

/// Writes the listing of the directory at `path`.
///
/// Returns `Ok(false)` without writing anything if there is no such
/// directory.
pub fn write_listing<S: ChildSource>(
    out: &mut impl Write,
    db: &mut FileDb<S>,
    path: &str,
    options: ListOptions,
) -> io::Result<bool> {
    if db.find_dir(path).is_none() {
        return Ok(false);
    }
    write_dir(out, db, path, 0, options)?;
    Ok(true)
}

fn write_dir<S: ChildSource>(
    out: &mut impl Write,
    db: &mut FileDb<S>,
    path: &str,
    depth: usize,
    options: ListOptions,
) -> io::Result<()> {
    // Owned copies, the recursion needs the database again.
    let Some((dirs, files)) = db.dir_contents(path, options.show_hidden, options.hide_clean)
    else {
        return Ok(());
    };
    let dirs: Vec<Entry> = dirs.cloned().collect();
    let files: Vec<Entry> = files.cloned().collect();

    for dir in &dirs {
        writeln!(out, "{}", format_entry(dir, depth, true))?;
        if options.recursive {
            write_dir(out, db, &join_path(path, dir.name()), depth + 1, options)?;
        }
    }
    for file in &files {
        writeln!(out, "{}", format_entry(file, depth, false))?;
    }

    Ok(())
}

fn join_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
