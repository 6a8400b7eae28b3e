//! Scratch directories laid out like a chart run.

use std::path::{Path, PathBuf};

/// Creates a temporary directory for test output, removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Model data and home folders under `root`, as the charts expect them.
///
/// Returns `(data_folder, home_folder)`; both exist on return.
pub fn chart_dirs(root: &Path) -> (PathBuf, PathBuf) {
    let data = root.join("icon-d2");
    let home = root.join("home");
    for dir in [&data, &home] {
        std::fs::create_dir_all(dir).expect("Failed to create chart directory");
    }
    (data, home)
}
