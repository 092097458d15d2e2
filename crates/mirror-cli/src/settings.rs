//! User settings
//!
//! Loaded from `config.toml` through [`ConfigStore`]; a missing file means
//! defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirror_core::{CompareMode, JsonLinesLog, ScanOptions, SessionLog, TracingLog, DEFAULT_IGNORE};
use mirror_fs::{ConfigStore, DirectoryTrash, NormalizedPath, SystemTrash, TrashStore};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where deleted and overwritten entries go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrashSetting {
    /// The platform trash / recycle bin
    System,
    /// A plain directory
    Directory(PathBuf),
}

impl From<String> for TrashSetting {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("system") {
            TrashSetting::System
        } else {
            TrashSetting::Directory(PathBuf::from(value))
        }
    }
}

impl From<TrashSetting> for String {
    fn from(value: TrashSetting) -> Self {
        match value {
            TrashSetting::System => "system".to_string(),
            TrashSetting::Directory(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Contents of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Comparison mode for routine scans
    pub compare_mode: CompareMode,
    /// Entry names skipped on both sides
    pub ignore: Vec<String>,
    /// Recoverable-delete destination
    pub trash: TrashSetting,
    /// Optional JSON-lines session log file
    pub session_log: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compare_mode: CompareMode::Shallow,
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            trash: TrashSetting::System,
            session_log: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load_or_default(&NormalizedPath::new(path))?)
    }

    /// Scan options, with `deep` forcing byte comparison.
    pub fn scan_options(&self, deep: bool) -> ScanOptions {
        let mode = if deep { CompareMode::Deep } else { self.compare_mode };
        ScanOptions::default()
            .with_mode(mode)
            .with_ignore(self.ignore.iter().cloned())
    }

    pub fn trash_store(&self) -> Arc<dyn TrashStore> {
        match &self.trash {
            TrashSetting::System => Arc::new(SystemTrash::new()),
            TrashSetting::Directory(dir) => Arc::new(DirectoryTrash::new(dir.clone())),
        }
    }

    pub fn session_log(&self) -> Result<Box<dyn SessionLog>> {
        Ok(match &self.session_log {
            Some(path) => Box::new(JsonLinesLog::create(path.clone())?),
            None => Box::new(TracingLog),
        })
    }
}
