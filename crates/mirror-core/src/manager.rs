//! Session orchestration
//!
//! [`ReconciliationManager`] owns the current [`Report`] for a root pair.
//! It is either idle (no report, or the roots changed since the last scan)
//! or scanned. Reconcile operations keep it scanned and drop every item
//! that succeeded from the held report, so a failed item can be retried.

use std::collections::HashSet;
use std::time::Instant;

use chrono::Utc;
use mirror_fs::{NormalizedPath, RelativePath};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::log::{SessionEvent, SessionLog, TracingLog};
use crate::{
    ActionExecutor, Category, Error, MoveDetector, MovePair, Report, Result, ScanOptions,
    TreeComparator,
};

/// Outcome of [`ReconciliationManager::reconcile_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Items applied successfully across all categories
    pub applied: usize,
    pub failed_moves: Vec<MovePair>,
    pub failed_added: Vec<RelativePath>,
    pub failed_removed: Vec<RelativePath>,
    pub failed_mismatched: Vec<RelativePath>,
}

impl ApplySummary {
    pub fn failed_count(&self) -> usize {
        self.failed_moves.len()
            + self.failed_added.len()
            + self.failed_removed.len()
            + self.failed_mismatched.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Holds the session state between scans and reconcile commands
pub struct ReconciliationManager {
    executor: ActionExecutor,
    options: ScanOptions,
    source: Option<NormalizedPath>,
    target: Option<NormalizedPath>,
    report: Option<Report>,
    log: Box<dyn SessionLog>,
}

impl ReconciliationManager {
    pub fn new(executor: ActionExecutor, options: ScanOptions) -> Self {
        Self {
            executor,
            options,
            source: None,
            target: None,
            report: None,
            log: Box::new(TracingLog),
        }
    }

    /// Replace the session log.
    pub fn with_log(mut self, log: Box<dyn SessionLog>) -> Self {
        self.log = log;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// The current report, if a scan for the current roots has completed.
    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn is_scanned(&self) -> bool {
        self.report.is_some()
    }

    /// The current root pair, once both are set.
    pub fn roots(&self) -> Option<(&NormalizedPath, &NormalizedPath)> {
        self.source.as_ref().zip(self.target.as_ref())
    }

    /// Change the source root; a different root invalidates the report.
    pub fn set_source_root(&mut self, root: impl Into<NormalizedPath>) {
        let root = root.into();
        if self.source.as_ref() != Some(&root) {
            self.source = Some(root);
            self.roots_changed();
        }
    }

    /// Change the target root; a different root invalidates the report.
    pub fn set_target_root(&mut self, root: impl Into<NormalizedPath>) {
        let root = root.into();
        if self.target.as_ref() != Some(&root) {
            self.target = Some(root);
            self.roots_changed();
        }
    }

    fn roots_changed(&mut self) {
        self.report = None;
        self.record(SessionEvent::RootsChanged {
            at: Utc::now(),
            source: self.source.clone(),
            target: self.target.clone(),
        });
    }

    /// Set the roots and compute a fresh report, replacing any held one.
    ///
    /// # Errors
    ///
    /// Fails if either root is missing or not a directory; no report is
    /// held afterwards.
    pub fn scan(
        &mut self,
        source: impl Into<NormalizedPath>,
        target: impl Into<NormalizedPath>,
    ) -> Result<&Report> {
        self.set_source_root(source);
        self.set_target_root(target);
        self.rescan()
    }

    /// Recompute the report for the current roots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] if no roots were ever set, or a root
    /// error if either root is unusable.
    pub fn rescan(&mut self) -> Result<&Report> {
        let (source, target) = match self.roots() {
            Some((s, t)) => (s.clone(), t.clone()),
            None => return Err(Error::NotScanned),
        };
        self.report = None;
        self.record(SessionEvent::ScanStarted {
            at: Utc::now(),
            source: source.clone(),
            target: target.clone(),
        });

        let started = Instant::now();
        let raw = TreeComparator::new(self.options.clone()).compare(&source, &target)?;
        let report = MoveDetector::new(self.options.ignore.iter().cloned()).detect(raw);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(elapsed_ms, in_sync = report.is_in_sync(), "Scan finished");

        self.record(SessionEvent::ScanCompleted {
            at: Utc::now(),
            report: report.clone(),
            elapsed_ms,
        });
        Ok(&*self.report.insert(report))
    }

    /// Copy added entries (or the given subset) to the target.
    ///
    /// Returns the items that could not be copied; everything else is
    /// removed from the report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] when idle, or a root error if the
    /// target root vanished.
    pub fn reconcile_added(&mut self, subset: Option<&[RelativePath]>) -> Result<Vec<RelativePath>> {
        self.reconcile_paths(Category::Added, subset)
    }

    /// Trash removed entries (or the given subset) from the target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] when idle, or a root error if the
    /// target root vanished.
    pub fn reconcile_removed(
        &mut self,
        subset: Option<&[RelativePath]>,
    ) -> Result<Vec<RelativePath>> {
        self.reconcile_paths(Category::Removed, subset)
    }

    /// Overwrite mismatched target files (or the given subset).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] when idle, or a root error if the
    /// target root vanished.
    pub fn reconcile_mismatched(
        &mut self,
        subset: Option<&[RelativePath]>,
    ) -> Result<Vec<RelativePath>> {
        self.reconcile_paths(Category::Mismatched, subset)
    }

    /// Apply detected moves (or the given subset) inside the target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] when idle.
    pub fn reconcile_moved(&mut self, subset: Option<&[MovePair]>) -> Result<Vec<MovePair>> {
        let report = self.report.as_ref().ok_or(Error::NotScanned)?;
        let (requested, mut failed) = select(subset, &report.moved);
        let requested_count = requested.len() + failed.len();

        let action_failed = self.executor.move_entries(&requested);
        let done: Vec<MovePair> = requested
            .into_iter()
            .filter(|pair| !action_failed.contains(pair))
            .collect();
        failed.extend(action_failed);

        if let Some(report) = self.report.as_mut() {
            report.remove_moves(&done);
        }
        self.record_action(Category::Moved, requested_count, failed.len());
        Ok(failed)
    }

    /// Reconcile one category, naming items by relative path.
    ///
    /// For [`Category::Moved`] a path selects the pairs whose destination
    /// lies at that path under the target root, and failures are reported
    /// by destination path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] when idle, or a root error if the
    /// target root vanished.
    pub fn reconcile(
        &mut self,
        category: Category,
        subset: Option<&[RelativePath]>,
    ) -> Result<Vec<RelativePath>> {
        if category != Category::Moved {
            return self.reconcile_paths(category, subset);
        }

        let report = self.report.as_ref().ok_or(Error::NotScanned)?;
        let target = report.target.clone();
        let destination = |pair: &MovePair| pair.to.relative_to(&target);

        let (pairs, mut failed) = match subset {
            None => (None, Vec::new()),
            Some(paths) => {
                let by_destination: Vec<MovePair> = report
                    .moved
                    .iter()
                    .filter(|pair| destination(pair).is_some_and(|rel| paths.contains(&rel)))
                    .cloned()
                    .collect();
                let unknown = paths
                    .iter()
                    .filter(|path| {
                        !by_destination
                            .iter()
                            .any(|pair| destination(pair).as_ref() == Some(*path))
                    })
                    .cloned()
                    .collect();
                (Some(by_destination), unknown)
            }
        };

        let failed_pairs = self.reconcile_moved(pairs.as_deref())?;
        failed.extend(
            failed_pairs
                .iter()
                .map(|pair| destination(pair).unwrap_or_else(|| RelativePath::new(pair.to.as_str()))),
        );
        Ok(failed)
    }

    /// Apply every category: moves, then a rescan, then added, removed and
    /// mismatched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotScanned`] when idle, or a root error if a root
    /// vanished during the run.
    pub fn reconcile_all(&mut self) -> Result<ApplySummary> {
        let before_moves = self.report.as_ref().ok_or(Error::NotScanned)?.moved.len();
        let mut summary = ApplySummary {
            failed_moves: self.reconcile_moved(None)?,
            ..ApplySummary::default()
        };
        summary.applied += before_moves - summary.failed_moves.len();

        if before_moves > 0 {
            debug!("Rescanning after moves");
            self.rescan()?;
        }

        for category in [Category::Added, Category::Removed, Category::Mismatched] {
            let pending = self.report.as_ref().map_or(0, |r| r.count(category));
            let failed = self.reconcile_paths(category, None)?;
            summary.applied += pending - failed.len();
            match category {
                Category::Added => summary.failed_added = failed,
                Category::Removed => summary.failed_removed = failed,
                _ => summary.failed_mismatched = failed,
            }
        }

        info!(
            applied = summary.applied,
            failed = summary.failed_count(),
            "Reconciliation finished"
        );
        Ok(summary)
    }

    fn reconcile_paths(
        &mut self,
        category: Category,
        subset: Option<&[RelativePath]>,
    ) -> Result<Vec<RelativePath>> {
        let report = self.report.as_ref().ok_or(Error::NotScanned)?;
        let available = report.paths(category).unwrap_or_default();
        let (requested, mut failed) = select(subset, available);
        let (source, target) = (report.source.clone(), report.target.clone());

        let action_failed = match category {
            Category::Added => self.executor.copy(&source, &target, &requested, false)?,
            Category::Removed => self.executor.delete(&target, &requested)?,
            Category::Mismatched => self.executor.update(&source, &target, &requested)?,
            Category::Moved => Vec::new(),
        };

        let failed_set: HashSet<&RelativePath> = action_failed.iter().collect();
        let done: Vec<RelativePath> = requested
            .into_iter()
            .filter(|path| !failed_set.contains(path))
            .collect();
        failed.extend(action_failed);

        if let Some(report) = self.report.as_mut() {
            report.remove_paths(category, &done);
        }
        self.record_action(category, done.len() + failed.len(), failed.len());
        Ok(failed)
    }

    fn record_action(&mut self, category: Category, requested: usize, failed: usize) {
        self.record(SessionEvent::ActionCompleted {
            at: Utc::now(),
            category,
            requested,
            failed,
        });
    }

    fn record(&mut self, event: SessionEvent) {
        self.log.record(&event);
    }
}

/// Split a requested subset into items present in `available` and unknown
/// items, which count as failures. `None` selects everything available.
fn select<T: Clone + PartialEq>(requested: Option<&[T]>, available: &[T]) -> (Vec<T>, Vec<T>) {
    match requested {
        None => (available.to_vec(), Vec::new()),
        Some(items) => {
            let mut known = Vec::new();
            let mut unknown = Vec::new();
            for item in items {
                if !available.contains(item) {
                    unknown.push(item.clone());
                } else if !known.contains(item) {
                    known.push(item.clone());
                }
            }
            (known, unknown)
        }
    }
}
