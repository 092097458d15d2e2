//! Filesystem actions that bring the target in line with the source
//!
//! Every operation returns exactly the requested items it could not
//! complete. Expected conditions (missing source, existing destination,
//! a trash store refusing an item) are reported that way, never as `Err`.
//! Destructive removals always go through the injected [`TrashStore`].

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use mirror_fs::{NormalizedPath, RelativePath, TrashStore, copy_file, copy_tree};
use tracing::{debug, info, warn};

use crate::error::ensure_root;
use crate::{MovePair, Result};

/// Stateless copy / delete / move operations between two roots
#[derive(Clone)]
pub struct ActionExecutor {
    trash: Arc<dyn TrashStore>,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor").finish_non_exhaustive()
    }
}

impl ActionExecutor {
    pub fn new(trash: Arc<dyn TrashStore>) -> Self {
        Self { trash }
    }

    /// Copy `paths` from `source_root` to `target_root`.
    ///
    /// Directories are copied whole and never overwritten. An existing
    /// destination file fails unless `overwrite` is set, in which case it is
    /// trashed first and the copy is skipped if trashing fails.
    ///
    /// # Errors
    ///
    /// Returns an error only if `target_root` is missing or not a directory.
    pub fn copy(
        &self,
        source_root: &NormalizedPath,
        target_root: &NormalizedPath,
        paths: &[RelativePath],
        overwrite: bool,
    ) -> Result<Vec<RelativePath>> {
        ensure_root(&target_root.to_native())?;

        let mut failed = Vec::new();
        for rel in paths {
            let from = rel.resolve(source_root);
            let to = rel.resolve(target_root);
            debug!("{} --> {}", from.display(), to.display());
            if let Err(e) = self.copy_entry(&from, &to, overwrite) {
                warn!("Copy of {} failed: {}", rel, e);
                failed.push(rel.clone());
            }
        }
        info!(
            requested = paths.len(),
            failed = failed.len(),
            overwrite,
            "Done copying"
        );
        Ok(failed)
    }

    /// Copy with overwrite: replace changed target files.
    ///
    /// # Errors
    ///
    /// Returns an error only if `target_root` is missing or not a directory.
    pub fn update(
        &self,
        source_root: &NormalizedPath,
        target_root: &NormalizedPath,
        paths: &[RelativePath],
    ) -> Result<Vec<RelativePath>> {
        self.copy(source_root, target_root, paths, true)
    }

    /// Send `paths` under `root` to the trash. Missing entries fail.
    ///
    /// # Errors
    ///
    /// Returns an error only if `root` is missing or not a directory.
    pub fn delete(&self, root: &NormalizedPath, paths: &[RelativePath]) -> Result<Vec<RelativePath>> {
        ensure_root(&root.to_native())?;

        let mut failed = Vec::new();
        for rel in paths {
            let path = rel.resolve(root);
            if rel.is_root() || fs::symlink_metadata(&path).is_err() {
                warn!("Nothing to delete at {}", path.display());
                failed.push(rel.clone());
                continue;
            }
            debug!("Deleting {}", path.display());
            if let Err(e) = self.trash.discard(&path) {
                warn!("Delete of {} failed: {}", rel, e);
                failed.push(rel.clone());
            }
        }
        info!(requested = paths.len(), failed = failed.len(), "Done deleting");
        Ok(failed)
    }

    /// Relocate entries. A pair fails if its destination already exists or
    /// its origin is gone. Only the destination's missing parent chain is
    /// created.
    pub fn move_entries(&self, pairs: &[MovePair]) -> Vec<MovePair> {
        let mut failed = Vec::new();
        for pair in pairs {
            if let Err(e) = self.move_entry(&pair.from.to_native(), &pair.to.to_native()) {
                warn!("Move {} failed: {}", pair, e);
                failed.push(pair.clone());
            }
        }
        info!(requested = pairs.len(), failed = failed.len(), "Done moving");
        failed
    }

    fn copy_entry(&self, from: &Path, to: &Path, overwrite: bool) -> mirror_fs::Result<()> {
        let meta = fs::metadata(from).map_err(|_| mirror_fs::Error::not_found(from))?;

        if meta.is_dir() {
            if exists(to) {
                return Err(mirror_fs::Error::already_exists(to));
            }
            return copy_tree(from, to);
        }
        if !meta.is_file() {
            return Err(mirror_fs::Error::not_found(from));
        }

        if exists(to) {
            if !overwrite {
                return Err(mirror_fs::Error::already_exists(to));
            }
            debug!("Overwriting {}", to.display());
            self.trash.discard(to)?;
        }
        copy_file(from, to)
    }

    fn move_entry(&self, from: &Path, to: &Path) -> mirror_fs::Result<()> {
        if exists(to) {
            return Err(mirror_fs::Error::already_exists(to));
        }
        if !exists(from) {
            return Err(mirror_fs::Error::not_found(from));
        }
        if let Some(parent) = to.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| mirror_fs::Error::io(parent, e))?;
        }

        debug!("Moving {} to {}", from.display(), to.display());
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                if from.is_dir() {
                    copy_tree(from, to)?;
                } else {
                    copy_file(from, to)?;
                }
                self.trash.discard(from)
            }
            Err(e) => Err(mirror_fs::Error::io(from, e)),
        }
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
