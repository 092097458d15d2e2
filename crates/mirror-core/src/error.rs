//! Error types for mirror-core

use std::path::PathBuf;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-core operations
///
/// Per-entry problems never show up here: comparison failures land in the
/// report's `errors` list and action failures are returned as failed items.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scan or action root does not exist
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// A scan or action root exists but is not a directory
    #[error("Root is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    /// A reconcile operation was requested without a current report
    #[error("No current report; run a scan first")]
    NotScanned,

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn root_not_found(path: impl Into<PathBuf>) -> Self {
        Self::RootNotFound { path: path.into() }
    }

    pub(crate) fn root_not_directory(path: impl Into<PathBuf>) -> Self {
        Self::RootNotDirectory { path: path.into() }
    }
}

/// Fail unless `root` is an existing directory.
pub(crate) fn ensure_root(root: &std::path::Path) -> Result<()> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::root_not_directory(root)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::root_not_found(root)),
        Err(e) => Err(mirror_fs::Error::io(root, e).into()),
    }
}
