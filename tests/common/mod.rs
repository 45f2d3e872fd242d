use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::Path;

pub fn fsdb_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("fsdb");
    cmd.arg("-C").arg(cwd);
    cmd
}

/// Creates each file, and its parent directories, under `root`.
pub fn write_tree(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, file.as_bytes()).unwrap();
    }
}

// Each integration test file is compiled as its own crate, and only the
// report-based tests need this one.
#[allow(dead_code)]
pub fn write_report(root: &Path, report: &str) -> std::path::PathBuf {
    let path = root.join("status.txt");
    fs::write(&path, report).unwrap();
    path
}
