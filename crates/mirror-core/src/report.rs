//! Report types for a comparison pass
//!
//! A [`Report`] is scoped to one (source, target) root pair. It is created
//! fresh by every scan, rewritten by move detection and shrunk by
//! reconciliation as items succeed.

use std::collections::HashSet;

use mirror_fs::{NormalizedPath, RelativePath};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A relocation inside the target tree that mirrors a source-side move
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovePair {
    /// Current location in the target tree
    pub from: NormalizedPath,
    /// Location the entry must move to
    pub to: NormalizedPath,
}

impl MovePair {
    pub fn new(from: impl Into<NormalizedPath>, to: impl Into<NormalizedPath>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for MovePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} --> {}", self.from, self.to)
    }
}

/// The report categories that can be reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Present only under the source; copied to the target
    Added,
    /// Present only under the target; sent to the trash
    Removed,
    /// Present on both sides with different content; overwritten
    Mismatched,
    /// Relocated in the source; moved inside the target
    Moved,
}

impl Category {
    /// All categories, in the order a full reconciliation applies them
    pub const ALL: [Category; 4] = [
        Category::Moved,
        Category::Added,
        Category::Removed,
        Category::Mismatched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Added => "added",
            Category::Removed => "removed",
            Category::Mismatched => "mismatched",
            Category::Moved => "moved",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry counts per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub added: usize,
    pub removed: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub errors: usize,
    pub moved: usize,
}

/// The classified result of one comparison pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Source root the report was produced for
    pub source: NormalizedPath,
    /// Target root the report was produced for
    pub target: NormalizedPath,
    /// Present only under the source
    pub added: Vec<RelativePath>,
    /// Present only under the target
    pub removed: Vec<RelativePath>,
    /// Present on both sides and equal
    pub matched: Vec<RelativePath>,
    /// Present on both sides and different
    pub mismatched: Vec<RelativePath>,
    /// Could not be compared
    pub errors: Vec<RelativePath>,
    /// Relocations to apply inside the target, in detection order
    pub moved: Vec<MovePair>,
}

impl Report {
    /// Create an empty report for a root pair
    pub fn new(source: NormalizedPath, target: NormalizedPath) -> Self {
        Self {
            source,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            matched: Vec::new(),
            mismatched: Vec::new(),
            errors: Vec::new(),
            moved: Vec::new(),
        }
    }

    /// True when there is nothing left to reconcile and nothing failed to compare
    pub fn is_in_sync(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.mismatched.is_empty()
            && self.moved.is_empty()
            && self.errors.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            added: self.added.len(),
            removed: self.removed.len(),
            matched: self.matched.len(),
            mismatched: self.mismatched.len(),
            errors: self.errors.len(),
            moved: self.moved.len(),
        }
    }

    /// The relative paths held by a path category.
    ///
    /// Returns `None` for [`Category::Moved`], whose entries are pairs.
    pub fn paths(&self, category: Category) -> Option<&[RelativePath]> {
        match category {
            Category::Added => Some(&self.added),
            Category::Removed => Some(&self.removed),
            Category::Mismatched => Some(&self.mismatched),
            Category::Moved => None,
        }
    }

    /// Number of entries in a category
    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Moved => self.moved.len(),
            other => self.paths(other).map_or(0, <[RelativePath]>::len),
        }
    }

    /// Drop `done` from a path category, keeping the order of the rest.
    ///
    /// Has no effect for [`Category::Moved`].
    pub fn remove_paths(&mut self, category: Category, done: &[RelativePath]) {
        let done: HashSet<&RelativePath> = done.iter().collect();
        let list = match category {
            Category::Added => &mut self.added,
            Category::Removed => &mut self.removed,
            Category::Mismatched => &mut self.mismatched,
            Category::Moved => return,
        };
        list.retain(|path| !done.contains(path));
    }

    /// Drop completed move pairs, keeping the order of the rest.
    pub fn remove_moves(&mut self, done: &[MovePair]) {
        let done: HashSet<&MovePair> = done.iter().collect();
        self.moved.retain(|pair| !done.contains(pair));
    }

    /// Pretty JSON rendering for audit output.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        let mut report = Report::new(NormalizedPath::new("/src"), NormalizedPath::new("/bak"));
        report.added = vec!["a.txt".into(), "b.txt".into(), "c.txt".into()];
        report.matched = vec!["file1.txt".into()];
        report.moved = vec![MovePair::new("/bak/old", "/bak/new")];
        report
    }

    #[test]
    fn test_move_pair_display() {
        let pair = MovePair::new("/bak/old", "/bak/new");
        assert_eq!(pair.to_string(), "/bak/old --> /bak/new");
    }

    #[test]
    fn test_empty_report_is_in_sync() {
        let report = Report::new(NormalizedPath::new("/src"), NormalizedPath::new("/bak"));
        assert!(report.is_in_sync());
    }

    #[test]
    fn test_matched_entries_do_not_break_sync() {
        let mut report = Report::new(NormalizedPath::new("/src"), NormalizedPath::new("/bak"));
        report.matched.push("file1.txt".into());
        assert!(report.is_in_sync());
    }

    #[test]
    fn test_remove_paths_keeps_order() {
        let mut report = sample();
        report.remove_paths(Category::Added, &["b.txt".into()]);
        let left: Vec<&str> = report.added.iter().map(|p| p.as_str()).collect();
        assert_eq!(left, ["a.txt", "c.txt"]);
    }

    #[test]
    fn test_remove_moves() {
        let mut report = sample();
        report.remove_moves(&[MovePair::new("/bak/old", "/bak/new")]);
        assert!(report.moved.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let summary = sample().summary();
        assert_eq!(summary.added, 3);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.moved, 1);
        assert_eq!(sample().count(Category::Moved), 1);
        assert_eq!(sample().count(Category::Removed), 0);
    }

    #[test]
    fn test_json_uses_plain_strings() {
        let json = sample().to_json_pretty().unwrap();
        assert!(json.contains("\"file1.txt\""));
        assert!(json.contains("\"from\": \"/bak/old\""));
    }
}
