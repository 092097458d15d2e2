//! [`TreePair`] builder for source/target reconciliation scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::tree;

/// A temporary source tree and target tree side by side.
///
/// Both live under one temporary directory (`test_src/` and `test_bak/`)
/// together with a `trash/` directory, so renames and recoverable deletes
/// stay on one filesystem.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TreePair;
///
/// let pair = TreePair::standard();
/// pair.rename_source("subdir", "newdir");
/// pair.assert_source_exists("newdir/file2.txt");
/// ```
pub struct TreePair {
    temp_dir: TempDir,
}

impl Default for TreePair {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePair {
    /// Create empty source and target trees.
    ///
    /// # Panics
    /// Panics if the temporary directories cannot be created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("TreePair::new: failed to create temp dir");
        fs::create_dir(temp_dir.path().join("test_src"))
            .expect("TreePair::new: failed to create source tree");
        fs::create_dir(temp_dir.path().join("test_bak"))
            .expect("TreePair::new: failed to create target tree");
        Self { temp_dir }
    }

    /// Create a pair where both sides hold the identical reference tree.
    pub fn standard() -> Self {
        let pair = Self::new();
        tree::standard_tree(&pair.source());
        tree::standard_tree(&pair.target());
        pair
    }

    /// Directory holding both trees.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> PathBuf {
        self.root().join("test_src")
    }

    pub fn target(&self) -> PathBuf {
        self.root().join("test_bak")
    }

    /// Directory intended for a directory-backed trash store.
    pub fn trash_dir(&self) -> PathBuf {
        self.root().join("trash")
    }

    pub fn write_source(&self, rel: &str, content: &str) {
        tree::write_file(&self.source(), rel, content);
    }

    pub fn write_target(&self, rel: &str, content: &str) {
        tree::write_file(&self.target(), rel, content);
    }

    /// Write the same file to both sides.
    pub fn write_both(&self, rel: &str, content: &str) {
        self.write_source(rel, content);
        self.write_target(rel, content);
    }

    /// Overwrite a source file with new content and a later mtime.
    pub fn edit_source(&self, rel: &str, content: &str) {
        tree::write_file_at(&self.source(), rel, content, tree::edited_mtime());
    }

    pub fn mkdir_source(&self, rel: &str) {
        tree::make_dir(&self.source(), rel);
    }

    pub fn mkdir_target(&self, rel: &str) {
        tree::make_dir(&self.target(), rel);
    }

    /// Rename or move an entry inside the source tree.
    ///
    /// # Panics
    /// Panics if the rename fails.
    pub fn rename_source(&self, from: &str, to: &str) {
        let src = self.source().join(from);
        let dst = self.source().join(to);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("rename_source: failed to create {}: {e}", parent.display())
            });
        }
        fs::rename(&src, &dst).unwrap_or_else(|e| {
            panic!(
                "rename_source: failed to move {} to {}: {e}",
                src.display(),
                dst.display()
            )
        });
    }

    /// Read a target-side file.
    pub fn read_target(&self, rel: &str) -> String {
        tree::read_file(&self.target(), rel)
    }

    /// Assert that `rel` exists in the source tree.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_source_exists(&self, rel: &str) {
        let path = self.source().join(rel);
        assert!(path.exists(), "Expected source entry to exist: {}", path.display());
    }

    /// Assert that `rel` exists in the target tree.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_target_exists(&self, rel: &str) {
        let path = self.target().join(rel);
        assert!(path.exists(), "Expected target entry to exist: {}", path.display());
    }

    /// Assert that `rel` does **not** exist in the target tree.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_target_missing(&self, rel: &str) {
        let path = self.target().join(rel);
        assert!(
            !path.exists(),
            "Expected target entry NOT to exist: {}",
            path.display()
        );
    }
}
