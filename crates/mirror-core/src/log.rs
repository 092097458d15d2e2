//! Session logging
//!
//! The manager reports what it does to an injected [`SessionLog`] instead
//! of writing to a global log file. Events are serializable so a session
//! can be kept as an audit trail.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use mirror_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

use crate::{Category, Report, Result};

/// Something that happened during a reconciliation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    ScanStarted {
        at: DateTime<Utc>,
        source: NormalizedPath,
        target: NormalizedPath,
    },
    ScanCompleted {
        at: DateTime<Utc>,
        report: Report,
        elapsed_ms: u64,
    },
    ActionCompleted {
        at: DateTime<Utc>,
        category: Category,
        requested: usize,
        failed: usize,
    },
    RootsChanged {
        at: DateTime<Utc>,
        source: Option<NormalizedPath>,
        target: Option<NormalizedPath>,
    },
}

impl SessionEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::ScanStarted { at, .. }
            | SessionEvent::ScanCompleted { at, .. }
            | SessionEvent::ActionCompleted { at, .. }
            | SessionEvent::RootsChanged { at, .. } => *at,
        }
    }
}

/// Sink for session events
pub trait SessionLog: Send {
    fn record(&mut self, event: &SessionEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl SessionLog for TracingLog {
    fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ScanStarted { source, target, .. } => {
                tracing::info!(%source, %target, "Scan started");
            }
            SessionEvent::ScanCompleted {
                report, elapsed_ms, ..
            } => {
                let summary = report.summary();
                tracing::info!(
                    elapsed_ms,
                    added = summary.added,
                    removed = summary.removed,
                    matched = summary.matched,
                    mismatched = summary.mismatched,
                    moved = summary.moved,
                    errors = summary.errors,
                    "Scan completed"
                );
            }
            SessionEvent::ActionCompleted {
                category,
                requested,
                failed,
                ..
            } => {
                tracing::info!(%category, requested, failed, "Action completed");
            }
            SessionEvent::RootsChanged { source, target, .. } => {
                tracing::info!(?source, ?target, "Roots changed");
            }
        }
    }
}

/// Appends one JSON object per event to a file
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesLog {
    /// Open `path` for appending, creating it and its parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Open a fresh log named after the current time inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn timestamped(dir: impl AsRef<Path>) -> Result<Self> {
        let name = format!("{}.jsonl", Utc::now().format("%Y-%m-%d-%H-%M-%S"));
        Self::create(dir.as_ref().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_event(&mut self, event: &SessionEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl SessionLog for JsonLinesLog {
    fn record(&mut self, event: &SessionEvent) {
        if let Err(e) = self.write_event(event) {
            tracing::warn!("Failed to write session log {}: {}", self.path.display(), e);
        }
    }
}

/// Keeps events in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl SessionLog for MemoryLog {
    fn record(&mut self, event: &SessionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
