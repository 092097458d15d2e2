//! Lock-step comparison of two directory trees
//!
//! The comparator classifies every entry it meets into the report's
//! `added`, `removed`, `matched`, `mismatched` and `errors` lists. It knows
//! nothing about moves; see [`crate::MoveDetector`] for that.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::Instant;

use mirror_fs::{NormalizedPath, RelativePath};
use tracing::{debug, info};

use crate::error::ensure_root;
use crate::{CompareMode, Report, Result, ScanOptions};

const CHUNK_SIZE: usize = 8 * 1024;

/// Recursive two-tree comparator
#[derive(Debug, Clone, Default)]
pub struct TreeComparator {
    options: ScanOptions,
}

impl TreeComparator {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Compare `source` against `target` and return the classified report.
    ///
    /// Within each level, names are visited in sorted order; the entries of
    /// common subdirectories follow the level's own entries, one subdirectory
    /// at a time in sorted order. The `moved` list is left empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::RootNotFound`] or
    /// [`crate::Error::RootNotDirectory`] if either root is unusable, and an
    /// I/O error if a root cannot be listed. Failures below the roots are
    /// recorded in the report's `errors` list instead, as are names that
    /// are not valid UTF-8.
    pub fn compare(&self, source: &NormalizedPath, target: &NormalizedPath) -> Result<Report> {
        let left = source.to_native();
        let right = target.to_native();
        ensure_root(&left)?;
        ensure_root(&right)?;

        info!(%source, %target, mode = %self.options.mode, "Comparing trees");
        let started = Instant::now();

        let left_entries = list_entries(&left, &self.options.ignore)
            .map_err(|e| mirror_fs::Error::io(&left, e))?;
        let right_entries = list_entries(&right, &self.options.ignore)
            .map_err(|e| mirror_fs::Error::io(&right, e))?;

        let mut report = Report::new(source.clone(), target.clone());
        self.compare_level(
            &left,
            &right,
            &RelativePath::root(),
            &left_entries,
            &right_entries,
            &mut report,
        );

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Comparison finished"
        );
        Ok(report)
    }

    fn compare_level(
        &self,
        left: &Path,
        right: &Path,
        prefix: &RelativePath,
        left_entries: &Entries,
        right_entries: &Entries,
        report: &mut Report,
    ) {
        // Undecodable names cannot be addressed by a relative path; each is
        // reported once so that two of them never fold into one entry
        for raw in left_entries.opaque.union(&right_entries.opaque) {
            let rel = prefix.child(&raw.to_string_lossy());
            debug!("Name under {} is not valid UTF-8: {:?}", left.display(), raw);
            report.errors.push(rel);
        }

        let left_names = &left_entries.names;
        let right_names = &right_entries.names;
        let mut common_dirs = Vec::new();

        for name in left_names.union(right_names) {
            let rel = prefix.child(name);
            match (left_names.contains(name), right_names.contains(name)) {
                (true, false) => report.added.push(rel),
                (false, true) => report.removed.push(rel),
                _ => {
                    let left_path = left.join(name);
                    let right_path = right.join(name);
                    let (left_meta, right_meta) =
                        match (fs::metadata(&left_path), fs::metadata(&right_path)) {
                            (Ok(l), Ok(r)) => (l, r),
                            (Err(e), _) | (_, Err(e)) => {
                                debug!("Cannot stat {}: {}", rel, e);
                                report.errors.push(rel);
                                continue;
                            }
                        };

                    if left_meta.is_dir() && right_meta.is_dir() {
                        common_dirs.push(name.as_str());
                    } else if left_meta.is_file() && right_meta.is_file() {
                        match self.files_equal(&left_path, &right_path, &left_meta, &right_meta) {
                            Ok(true) => report.matched.push(rel),
                            Ok(false) => report.mismatched.push(rel),
                            Err(e) => {
                                debug!("Cannot compare {}: {}", rel, e);
                                report.errors.push(rel);
                            }
                        }
                    } else if is_regular(&left_meta) && is_regular(&right_meta) {
                        // File on one side, directory on the other
                        report.added.push(rel.clone());
                        report.removed.push(rel);
                    } else {
                        report.errors.push(rel);
                    }
                }
            }
        }

        for name in common_dirs {
            let rel = prefix.child(name);
            let left_dir = left.join(name);
            let right_dir = right.join(name);
            debug!("Checking subfolder {}", rel);

            let listed = list_entries(&left_dir, &self.options.ignore)
                .and_then(|l| list_entries(&right_dir, &self.options.ignore).map(|r| (l, r)));
            match listed {
                Ok((sub_left, sub_right)) => {
                    self.compare_level(&left_dir, &right_dir, &rel, &sub_left, &sub_right, report)
                }
                Err(e) => {
                    debug!("Cannot list {}: {}", rel, e);
                    report.errors.push(rel);
                }
            }
        }
    }

    fn files_equal(
        &self,
        left: &Path,
        right: &Path,
        left_meta: &Metadata,
        right_meta: &Metadata,
    ) -> io::Result<bool> {
        match self.options.mode {
            CompareMode::Shallow => Ok(left_meta.len() == right_meta.len()
                && left_meta.modified()? == right_meta.modified()?),
            CompareMode::Deep => deep_equal(left, right),
        }
    }
}

fn is_regular(meta: &Metadata) -> bool {
    meta.is_file() || meta.is_dir()
}

/// Children of one directory, sorted
#[derive(Debug, Default)]
pub(crate) struct Entries {
    pub(crate) names: BTreeSet<String>,
    /// Names that are not valid UTF-8
    pub(crate) opaque: BTreeSet<OsString>,
}

/// Names directly under `dir`, minus ignored names.
pub(crate) fn list_entries(dir: &Path, ignore: &[String]) -> io::Result<Entries> {
    let mut entries = Entries::default();
    for entry in fs::read_dir(dir)? {
        match entry?.file_name().into_string() {
            Ok(name) => {
                if !ignore.iter().any(|ignored| *ignored == name) {
                    entries.names.insert(name);
                }
            }
            Err(raw) => {
                entries.opaque.insert(raw);
            }
        }
    }
    Ok(entries)
}

/// Byte-for-byte equality of two files.
pub fn deep_equal(left: &Path, right: &Path) -> io::Result<bool> {
    if fs::metadata(left)?.len() != fs::metadata(right)?.len() {
        return Ok(false);
    }

    let mut left_file = File::open(left)?;
    let mut right_file = File::open(right)?;
    let mut left_buf = [0u8; CHUNK_SIZE];
    let mut right_buf = [0u8; CHUNK_SIZE];

    loop {
        let left_len = read_chunk(&mut left_file, &mut left_buf)?;
        let right_len = read_chunk(&mut right_file, &mut right_buf)?;
        if left_buf[..left_len] != right_buf[..right_len] {
            return Ok(false);
        }
        if left_len == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows; a short count means end of file.
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_test_utils::TreePair;
    use pretty_assertions::assert_eq;

    fn strings(paths: &[RelativePath]) -> Vec<&str> {
        paths.iter().map(|p| p.as_str()).collect()
    }

    fn compare(pair: &TreePair, options: ScanOptions) -> Report {
        TreeComparator::new(options)
            .compare(
                &NormalizedPath::new(pair.source()),
                &NormalizedPath::new(pair.target()),
            )
            .unwrap()
    }

    #[test]
    fn deep_equal_detects_same_size_difference() {
        let pair = TreePair::new();
        pair.write_source("a.txt", "abcd");
        pair.write_target("a.txt", "abce");

        assert!(!deep_equal(&pair.source().join("a.txt"), &pair.target().join("a.txt")).unwrap());
    }

    #[test]
    fn deep_equal_on_identical_content() {
        let pair = TreePair::new();
        let big = "x".repeat(CHUNK_SIZE * 3 + 17);
        pair.write_source("big.bin", &big);
        pair.write_target("big.bin", &big);

        assert!(deep_equal(&pair.source().join("big.bin"), &pair.target().join("big.bin")).unwrap());
    }

    #[test]
    fn shallow_mode_trusts_metadata() {
        let pair = TreePair::new();
        pair.write_source("a.txt", "abcd");
        pair.write_target("a.txt", "abce");

        let shallow = compare(&pair, ScanOptions::default());
        assert_eq!(strings(&shallow.matched), ["a.txt"]);

        let deep = compare(&pair, ScanOptions::default().with_mode(CompareMode::Deep));
        assert_eq!(strings(&deep.mismatched), ["a.txt"]);
    }

    #[test]
    fn kind_conflict_is_added_and_removed() {
        let pair = TreePair::new();
        pair.write_source("thing", "file here");
        pair.mkdir_target("thing");

        let report = compare(&pair, ScanOptions::default());

        assert_eq!(strings(&report.added), ["thing"]);
        assert_eq!(strings(&report.removed), ["thing"]);
        assert!(report.matched.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn ignored_names_are_skipped_on_both_sides() {
        let pair = TreePair::new();
        pair.write_source(".git/HEAD", "ref: refs/heads/main");
        pair.write_target("__pycache__/mod.pyc", "bytecode");
        pair.write_both("keep.txt", "kept");

        let report = compare(&pair, ScanOptions::default());
        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        assert_eq!(strings(&report.matched), ["keep.txt"]);

        let report = compare(&pair, ScanOptions::default().with_ignore(Vec::<String>::new()));
        assert_eq!(strings(&report.added), [".git"]);
        assert_eq!(strings(&report.removed), ["__pycache__"]);
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_on_both_sides_is_an_error() {
        let pair = TreePair::new();
        std::os::unix::fs::symlink("/nonexistent/a", pair.source().join("link")).unwrap();
        std::os::unix::fs::symlink("/nonexistent/b", pair.target().join("link")).unwrap();

        let report = compare(&pair, ScanOptions::default());
        assert_eq!(strings(&report.errors), ["link"]);
    }
}
