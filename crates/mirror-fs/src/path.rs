//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::relative::is_separator;
use crate::{Error, RelativePath, Result};

/// A filesystem path normalized to use forward slashes internally.
///
/// Used for tree roots and for the absolute endpoints of move pairs.
/// Converted to platform-native format only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// On Windows, backslashes become forward slashes; elsewhere a
    /// backslash is part of a filename and is kept.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            inner: normalize_separators(&path.as_ref().to_string_lossy()),
        }
    }

    /// Resolve `path` to an absolute, symlink-free path.
    ///
    /// Uses `dunce` so Windows paths do not carry the `\\?\` prefix.
    pub fn canonical(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dunce::canonicalize(path)
            .map(Self::new)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::not_found(path),
                _ => Error::io(path, e),
            })
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = normalize_separators(segment);
        if segment_normalized.is_empty() {
            return self.clone();
        }
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Join this path with a relative path; the root relative path yields `self`.
    pub fn join_relative(&self, relative: &RelativePath) -> Self {
        self.join(relative.as_str())
    }

    /// Express this path relative to `root`, if it lies beneath it.
    pub fn relative_to(&self, root: &NormalizedPath) -> Option<RelativePath> {
        let root = root.inner.trim_end_matches('/');
        let rest = self.inner.strip_prefix(root)?;
        if rest.is_empty() {
            return Some(RelativePath::root());
        }
        rest.strip_prefix('/').map(RelativePath::new)
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }
}

fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| if is_separator(c) { '/' } else { c })
        .collect()
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<NormalizedPath> for String {
    fn from(p: NormalizedPath) -> Self {
        p.inner
    }
}
