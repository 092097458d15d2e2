//! Recoverable deletion
//!
//! Every destructive removal in the workspace goes through a [`TrashStore`]
//! so that a mistaken reconciliation can be undone by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

/// A place that deleted entries are moved to instead of being unlinked.
pub trait TrashStore: Send + Sync {
    /// Move `path` (file or directory) out of its tree into the store.
    ///
    /// Fails with [`Error::NotFound`] if `path` does not exist.
    fn discard(&self, path: &Path) -> Result<()>;
}

/// The host platform's trash or recycle bin.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl SystemTrash {
    pub fn new() -> Self {
        Self
    }
}

impl TrashStore for SystemTrash {
    fn discard(&self, path: &Path) -> Result<()> {
        if fs::symlink_metadata(path).is_err() {
            return Err(Error::not_found(path));
        }
        debug!("Sending {} to the system trash", path.display());
        ::trash::delete(path).map_err(|e| Error::Trash {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A plain directory acting as the trash.
///
/// Each discarded entry lands in its own `<root>/<uuid>/` slot under its
/// original name, so repeated deletions of the same name never collide.
#[derive(Debug, Clone)]
pub struct DirectoryTrash {
    root: PathBuf,
}

impl DirectoryTrash {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of the entries currently held, sorted.
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for slot in fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))? {
            let slot = slot.map_err(|e| Error::io(&self.root, e))?.path();
            for entry in fs::read_dir(&slot).map_err(|e| Error::io(&slot, e))? {
                found.push(entry.map_err(|e| Error::io(&slot, e))?.path());
            }
        }
        found.sort();
        Ok(found)
    }
}

impl TrashStore for DirectoryTrash {
    fn discard(&self, path: &Path) -> Result<()> {
        if fs::symlink_metadata(path).is_err() {
            return Err(Error::not_found(path));
        }
        let name = path.file_name().ok_or_else(|| Error::Trash {
            path: path.to_path_buf(),
            message: "path has no file name".into(),
        })?;

        let slot = self.root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&slot).map_err(|e| Error::io(&slot, e))?;

        let destination = slot.join(name);
        debug!(
            "Moving {} to trash slot {}",
            path.display(),
            destination.display()
        );
        match fs::rename(path, &destination) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                // Different filesystem: copy into the slot, then drop the original
                let copied = if path.is_dir() {
                    crate::copy_tree(path, &destination)
                } else {
                    crate::copy_file(path, &destination)
                };
                if let Err(e) = copied {
                    drop_slot(&slot);
                    return Err(e);
                }
                if path.is_dir() {
                    fs::remove_dir_all(path).map_err(|e| Error::io(path, e))
                } else {
                    fs::remove_file(path).map_err(|e| Error::io(path, e))
                }
            }
            Err(e) => {
                drop_slot(&slot);
                Err(Error::io(path, e))
            }
        }
    }
}

/// Remove a slot that never received its entry.
fn drop_slot(slot: &Path) {
    if let Err(e) = fs::remove_dir_all(slot) {
        debug!("Could not remove trash slot {}: {}", slot.display(), e);
    }
}
