//! Deterministic file helpers.
//!
//! Shallow comparison treats two files as equal when size and modification
//! time agree, so fixtures that are meant to be identical must carry the same
//! mtime. Every helper here stamps [`fixture_mtime`] unless told otherwise.

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// The modification time stamped on every fixture file.
pub fn fixture_mtime() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000)
}

/// A modification time distinct from [`fixture_mtime`], for edited files.
pub fn edited_mtime() -> SystemTime {
    fixture_mtime() + Duration::from_secs(3_600)
}

/// Write `content` to `root/rel`, creating parents, stamped with `mtime`.
///
/// # Panics
/// Panics if any filesystem operation fails.
pub fn write_file_at(root: &Path, rel: &str, content: &str, mtime: SystemTime) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("write_file: failed to create {}: {e}", parent.display()));
    }
    fs::write(&path, content)
        .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", path.display()));
    File::options()
        .write(true)
        .open(&path)
        .and_then(|f| f.set_modified(mtime))
        .unwrap_or_else(|e| panic!("write_file: failed to stamp {}: {e}", path.display()));
}

/// Write `content` to `root/rel` with the fixture modification time.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    write_file_at(root, rel, content, fixture_mtime());
}

/// Create the directory `root/rel` and its parents.
///
/// # Panics
/// Panics if the directory cannot be created.
pub fn make_dir(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(&path)
        .unwrap_or_else(|e| panic!("make_dir: failed to create {}: {e}", path.display()));
}

/// Read `root/rel` as text.
///
/// # Panics
/// Panics if the file cannot be read.
pub fn read_file(root: &Path, rel: &str) -> String {
    let path = root.join(rel);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read_file: failed to read {}: {e}", path.display()))
}

/// Populate `root` with the three-file reference tree:
///
/// ```text
/// file1.txt
/// subdir/file2.txt
/// subdir/granddir/file3.txt
/// ```
pub fn standard_tree(root: &Path) {
    write_file(root, "file1.txt", "this is a file");
    write_file(root, "subdir/file2.txt", "this is a second file");
    write_file(root, "subdir/granddir/file3.txt", "this is a third file");
}
