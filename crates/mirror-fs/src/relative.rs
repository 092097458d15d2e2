//! Root-independent relative paths

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A path relative to a tree root, the unit of comparison between trees.
///
/// Always forward-slash separated, with no empty, `.` or `..` components,
/// so two values compare equal exactly when they denote the same position
/// under either root. The empty path is the root itself.
///
/// A backslash is a separator only on Windows; elsewhere it is an ordinary
/// filename character and survives unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RelativePath {
    inner: String,
}

impl RelativePath {
    /// Normalize any path-like input into a relative path.
    ///
    /// `..` pops the previous component and is discarded at the start, so
    /// the result can never point above the root.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        let mut parts: Vec<&str> = Vec::new();
        for component in raw.split(is_separator) {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        Self {
            inner: parts.join("/"),
        }
    }

    /// The relative path of the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Append a child entry name (or a nested relative path).
    pub fn join(&self, name: impl AsRef<Path>) -> Self {
        let child = Self::new(name);
        if self.is_root() {
            return child;
        }
        if child.is_root() {
            return self.clone();
        }
        Self {
            inner: format!("{}/{}", self.inner, child.inner),
        }
    }

    /// Append one directory entry name verbatim.
    ///
    /// `name` is taken as a single component, as returned by `read_dir`;
    /// it is not split or normalized.
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            return Self {
                inner: name.to_string(),
            };
        }
        Self {
            inner: format!("{}/{}", self.inner, name),
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.inner.rfind('/') {
            Some(idx) => Self {
                inner: self.inner[..idx].to_string(),
            },
            None => Self::root(),
        })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|c| !c.is_empty())
    }

    /// Number of components; the root has depth 0.
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Platform-native form of the relative path.
    pub fn to_native(&self) -> PathBuf {
        self.components().collect()
    }

    /// Absolute location of this entry under `root`.
    pub fn resolve(&self, root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(self.to_native())
    }
}

/// Path separators accepted in relative path input.
pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner)
    }
}

impl From<&str> for RelativePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RelativePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for RelativePath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl From<RelativePath> for String {
    fn from(p: RelativePath) -> Self {
        p.inner
    }
}

impl AsRef<str> for RelativePath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}
