//! Diff-and-reconcile engine for Tree Mirror
//!
//! This crate compares a source tree with a target tree and brings the
//! target in line with the source:
//!
//! - **TreeComparator**: lock-step recursive comparison into a [`Report`]
//! - **MoveDetector**: greedy pairing of added/removed entries into moves
//! - **ActionExecutor**: copy, trash and move operations returning failed items
//! - **ReconciliationManager**: holds the report and applies categories
//!
//! # Architecture
//!
//! ```text
//!              mirror-cli
//!                  |
//!             mirror-core
//!                  |
//!              mirror-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mirror_core::{ActionExecutor, ReconciliationManager, ScanOptions};
//! use mirror_fs::SystemTrash;
//!
//! fn example() -> mirror_core::Result<()> {
//!     let executor = ActionExecutor::new(Arc::new(SystemTrash::new()));
//!     let mut manager = ReconciliationManager::new(executor, ScanOptions::default());
//!     manager.scan("/data/music", "/backup/music")?;
//!     let failed = manager.reconcile_moved(None)?;
//!     assert!(failed.is_empty());
//!     Ok(())
//! }
//! ```

pub mod comparator;
pub mod detector;
pub mod error;
pub mod executor;
pub mod log;
pub mod manager;
pub mod options;
pub mod report;

pub use comparator::{TreeComparator, deep_equal};
pub use detector::MoveDetector;
pub use error::{Error, Result};
pub use executor::ActionExecutor;
pub use log::{JsonLinesLog, MemoryLog, SessionEvent, SessionLog, TracingLog};
pub use manager::{ApplySummary, ReconciliationManager};
pub use options::{CompareMode, DEFAULT_IGNORE, ScanOptions};
pub use report::{Category, MovePair, Report, ReportSummary};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_root_not_found_displays_path() {
        let error = Error::RootNotFound {
            path: PathBuf::from("/backup/missing"),
        };

        let display = format!("{}", error);
        assert!(
            display.contains("/backup/missing"),
            "Error display should contain the path, got: {}",
            display
        );
    }
}
