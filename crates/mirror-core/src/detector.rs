//! Heuristic move and rename detection
//!
//! Pairs `added` entries with `removed` entries that are really the same
//! content relocated, turning them into [`MovePair`]s on the target tree.
//!
//! Matching is greedy first-match in report order, not an optimal
//! assignment. When several identical files exist only the first
//! candidate is paired; the others stay in `added`/`removed`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use mirror_fs::{NormalizedPath, RelativePath};
use tracing::{debug, info};

use crate::comparator::{deep_equal, list_entries};
use crate::options::DEFAULT_IGNORE;
use crate::{MovePair, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Dir,
    Other,
}

fn kind_of(path: &Path) -> Kind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Kind::File,
        Ok(meta) if meta.is_dir() => Kind::Dir,
        _ => Kind::Other,
    }
}

/// One-level name overlap between two directories
struct Overlap {
    common: usize,
    left_only: Vec<String>,
    /// Left-only names that are not valid UTF-8
    left_opaque: usize,
    right_only: usize,
}

impl Overlap {
    /// Shared child names outnumber all non-shared names combined.
    fn is_majority(&self) -> bool {
        self.common > self.left_only.len() + self.left_opaque + self.right_only
    }
}

/// Converts added/removed pairs into move records
#[derive(Debug, Clone)]
pub struct MoveDetector {
    ignore: Vec<String>,
}

impl Default for MoveDetector {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE.iter().copied())
    }
}

impl MoveDetector {
    /// Create a detector whose directory sub-comparison skips `ignore` names.
    pub fn new<I, S>(ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore: ignore.into_iter().map(Into::into).collect(),
        }
    }

    /// Populate `report.moved` and shrink `added`/`removed` accordingly.
    ///
    /// For each added entry, in order:
    /// - a file pairs with the first unconsumed removed file whose content
    ///   is byte-identical;
    /// - a directory pairs with the first unconsumed removed directory whose
    ///   children overlap by majority; every child name present only on the
    ///   source side that is also a top-level `removed` entry is moved along
    ///   into the renamed directory.
    ///
    /// Removed entries already used as the origin of a recorded move are
    /// never paired again.
    pub fn detect(&self, mut report: Report) -> Report {
        let source = report.source.to_native();
        let target = report.target.to_native();

        let mut added_used = vec![false; report.added.len()];
        let mut removed_used: Vec<bool> = report
            .removed
            .iter()
            .map(|r| {
                let origin = report.target.join_relative(r);
                report.moved.iter().any(|pair| pair.from == origin)
            })
            .collect();
        let mut moved = Vec::new();

        for (i, added) in report.added.iter().enumerate() {
            let new_entry = added.resolve(&source);
            match kind_of(&new_entry) {
                Kind::File => {
                    let found = report.removed.iter().enumerate().find(|(j, removed)| {
                        if removed_used[*j] {
                            return false;
                        }
                        let old_entry = removed.resolve(&target);
                        kind_of(&old_entry) == Kind::File
                            && deep_equal(&new_entry, &old_entry).unwrap_or_else(|e| {
                                debug!("Cannot compare {} with {}: {}", added, removed, e);
                                false
                            })
                    });
                    if let Some((j, removed)) = found {
                        debug!("File {} looks moved from {}", added, removed);
                        moved.push(pair_for(&report.target, removed, added));
                        added_used[i] = true;
                        removed_used[j] = true;
                    }
                }
                Kind::Dir => {
                    let found = report.removed.iter().enumerate().find_map(|(j, removed)| {
                        if removed_used[j] {
                            return None;
                        }
                        let old_entry = removed.resolve(&target);
                        if kind_of(&old_entry) != Kind::Dir {
                            return None;
                        }
                        self.overlap(&new_entry, &old_entry)
                            .filter(Overlap::is_majority)
                            .map(|overlap| (j, removed, overlap))
                    });
                    let Some((j, removed, overlap)) = found else {
                        continue;
                    };

                    debug!("Directory {} looks renamed from {}", added, removed);
                    moved.push(pair_for(&report.target, removed, added));
                    added_used[i] = true;
                    removed_used[j] = true;

                    // Children that look removed at the top level moved along
                    // with the renamed directory
                    for name in &overlap.left_only {
                        let carried = report
                            .removed
                            .iter()
                            .enumerate()
                            .find(|(k, r)| !removed_used[*k] && r.as_str() == name.as_str());
                        if let Some((k, carried)) = carried {
                            debug!("{} moved along into {}", carried, added);
                            moved.push(pair_for(&report.target, carried, &added.child(name)));
                            removed_used[k] = true;
                        }
                    }
                }
                Kind::Other => {}
            }
        }

        report.added = keep_unused(report.added, &added_used);
        report.removed = keep_unused(report.removed, &removed_used);
        if !moved.is_empty() {
            info!(count = moved.len(), "Detected moves");
        }
        report.moved.extend(moved);
        report
    }

    fn overlap(&self, left: &Path, right: &Path) -> Option<Overlap> {
        let left = list_entries(left, &self.ignore).ok()?;
        let right = list_entries(right, &self.ignore).ok()?;
        Some(Overlap {
            common: left.names.intersection(&right.names).count()
                + left.opaque.intersection(&right.opaque).count(),
            left_only: left.names.difference(&right.names).cloned().collect(),
            left_opaque: left.opaque.difference(&right.opaque).count(),
            right_only: right.names.difference(&left.names).count()
                + right.opaque.difference(&left.opaque).count(),
        })
    }
}

fn pair_for(target: &NormalizedPath, from: &RelativePath, to: &RelativePath) -> MovePair {
    MovePair::new(target.join_relative(from), target.join_relative(to))
}

fn keep_unused(items: Vec<RelativePath>, used: &[bool]) -> Vec<RelativePath> {
    items
        .into_iter()
        .zip(used)
        .filter(|(_, used)| !**used)
        .map(|(item, _)| item)
        .collect()
}
