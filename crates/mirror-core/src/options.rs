//! Scan configuration

use serde::{Deserialize, Serialize};

/// Entry names skipped on both sides at every level unless overridden.
pub const DEFAULT_IGNORE: &[&str] = &[
    "RCS",
    "CVS",
    "tags",
    ".git",
    ".hg",
    ".bzr",
    "_darcs",
    "__pycache__",
];

/// How two regular files present on both sides are judged equal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Equal iff size and modification time match
    #[default]
    Shallow,
    /// Equal iff the contents are byte-for-byte identical
    Deep,
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareMode::Shallow => write!(f, "shallow"),
            CompareMode::Deep => write!(f, "deep"),
        }
    }
}

/// Options for a comparison pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// File comparison mode for entries present on both sides
    pub mode: CompareMode,
    /// Entry names skipped on both sides
    pub ignore: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mode: CompareMode::default(),
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the ignore list.
    pub fn with_ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.iter().any(|ignored| ignored == name)
    }
}
