//! Reconciliation through the manager
//!
//! Every test uses a directory-backed trash under the same temp dir so
//! deletions can be inspected afterwards.

use std::sync::Arc;

use mirror_core::{
    ActionExecutor, Category, Error, MemoryLog, MovePair, ReconciliationManager, ScanOptions,
    SessionEvent,
};
use mirror_fs::{DirectoryTrash, NormalizedPath, RelativePath};
use mirror_test_utils::TreePair;
use pretty_assertions::assert_eq;

fn manager(pair: &TreePair) -> ReconciliationManager {
    let executor = ActionExecutor::new(Arc::new(DirectoryTrash::new(pair.trash_dir())));
    ReconciliationManager::new(executor, ScanOptions::default())
}

fn scanned(pair: &TreePair) -> ReconciliationManager {
    let mut manager = manager(pair);
    manager.scan(pair.source(), pair.target()).unwrap();
    manager
}

fn rel(paths: &[&str]) -> Vec<RelativePath> {
    paths.iter().map(|p| RelativePath::new(p)).collect()
}

#[test]
fn test_reconcile_before_scan_is_rejected() {
    let pair = TreePair::standard();
    let mut manager = manager(&pair);

    assert!(matches!(
        manager.reconcile_added(None),
        Err(Error::NotScanned)
    ));
    assert!(matches!(manager.reconcile_moved(None), Err(Error::NotScanned)));
    assert!(matches!(manager.reconcile_all(), Err(Error::NotScanned)));
    assert!(matches!(manager.rescan(), Err(Error::NotScanned)));
}

#[test]
fn test_copy_added_files() {
    let pair = TreePair::standard();
    pair.write_source("new_file.txt", "this is an added file");
    pair.write_source("new_file2.txt", "this is an addedagd file");
    pair.write_source("new_file3.txt", "this is an added fidgale");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_added(None).unwrap();

    assert!(failed.is_empty());
    for name in ["new_file.txt", "new_file2.txt", "new_file3.txt"] {
        pair.assert_source_exists(name);
        pair.assert_target_exists(name);
    }
    assert!(manager.report().unwrap().added.is_empty());
}

#[test]
fn test_copy_added_folder() {
    let pair = TreePair::standard();
    pair.write_source("albums/one/track.flac", "la la");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_added(None).unwrap();

    assert!(failed.is_empty());
    assert_eq!(pair.read_target("albums/one/track.flac"), "la la");
}

#[test]
fn test_partial_failure_isolation() {
    let pair = TreePair::standard();
    pair.write_source("new_file.txt", "this is an added file");
    pair.write_source("new_file2.txt", "this is another added file");
    pair.write_source("new_file4.txt", "why not three of them");
    let mut manager = scanned(&pair);
    // Appears after the scan, so the copy must not clobber it
    pair.write_target("new_file2.txt", "diff");

    let failed = manager.reconcile_added(None).unwrap();

    assert_eq!(failed, rel(&["new_file2.txt"]));
    assert_eq!(manager.report().unwrap().added, rel(&["new_file2.txt"]));
    assert_eq!(pair.read_target("new_file2.txt"), "diff");
    pair.assert_target_exists("new_file.txt");
    pair.assert_target_exists("new_file4.txt");
}

#[test]
fn test_subset_leaves_the_rest() {
    let pair = TreePair::standard();
    pair.write_source("new_file.txt", "this is an added file");
    pair.write_source("new_file2.txt", "this is another added file");
    pair.write_source("new_file4.txt", "why not three of them");
    let mut manager = scanned(&pair);

    let failed = manager
        .reconcile_added(Some(&rel(&["new_file.txt", "new_file2.txt"])))
        .unwrap();

    assert!(failed.is_empty());
    assert_eq!(manager.report().unwrap().added, rel(&["new_file4.txt"]));
    pair.assert_target_missing("new_file4.txt");
}

#[test]
fn test_unknown_subset_items_fail_without_touching_disk() {
    let pair = TreePair::standard();
    pair.write_target("new_file.txt", "this is a removed file");
    let mut manager = scanned(&pair);

    let failed = manager
        .reconcile_removed(Some(&rel(&["file1.txt"])))
        .unwrap();

    assert_eq!(failed, rel(&["file1.txt"]));
    pair.assert_target_exists("file1.txt");
    assert_eq!(manager.report().unwrap().removed, rel(&["new_file.txt"]));
}

#[test]
fn test_remove_goes_to_trash() {
    let pair = TreePair::standard();
    pair.write_target("new_file.txt", "this is an added file");
    pair.write_target("new_file2.txt", "this is an addedagd file");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_removed(None).unwrap();

    assert!(failed.is_empty());
    pair.assert_target_missing("new_file.txt");
    pair.assert_target_missing("new_file2.txt");
    let trash = DirectoryTrash::new(pair.trash_dir());
    assert_eq!(trash.entries().unwrap().len(), 2);
}

#[test]
fn test_update_mismatched_then_rescan_matches() {
    let pair = TreePair::standard();
    pair.edit_source("subdir/file2.txt", "this file changed");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_mismatched(None).unwrap();

    assert!(failed.is_empty());
    assert_eq!(pair.read_target("subdir/file2.txt"), "this file changed");
    let report = manager.rescan().unwrap();
    assert!(report.is_in_sync());
    assert_eq!(report.matched.len(), 3);
}

#[test]
fn test_reconciliation_idempotence() {
    let pair = TreePair::standard();
    pair.write_source("subdir/new_file.txt", "this is an added file");
    let mut manager = scanned(&pair);

    manager.reconcile_added(None).unwrap();
    let report = manager.rescan().unwrap();

    let added = RelativePath::new("subdir/new_file.txt");
    assert!(!report.added.contains(&added));
    assert!(!report.mismatched.contains(&added));
    assert!(report.matched.contains(&added));
}

#[test]
fn test_move_in_target() {
    let pair = TreePair::standard();
    pair.write_both("new_file.txt", "this is an added file");
    pair.rename_source("new_file.txt", "subdir/new_file.txt");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_moved(None).unwrap();

    assert!(failed.is_empty());
    pair.assert_target_exists("subdir/new_file.txt");
    pair.assert_target_missing("new_file.txt");
    assert!(manager.rescan().unwrap().is_in_sync());
}

#[test]
fn test_move_renamed_folder_with_carried_file() {
    let pair = TreePair::standard();
    pair.rename_source("file1.txt", "subdir/file1.txt");
    pair.rename_source("subdir", "newdir");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_moved(None).unwrap();

    assert!(failed.is_empty());
    pair.assert_target_exists("newdir/file1.txt");
    pair.assert_target_exists("newdir/granddir/file3.txt");
    pair.assert_target_missing("subdir");
    pair.assert_target_missing("file1.txt");
    assert!(manager.rescan().unwrap().is_in_sync());
}

#[test]
fn test_move_onto_existing_destination_fails() {
    let pair = TreePair::standard();
    pair.write_both("new_file.txt", "this is an added file");
    pair.rename_source("new_file.txt", "subdir/new_file.txt");
    let mut manager = scanned(&pair);
    pair.write_target("subdir/new_file.txt", "blah");

    let failed = manager.reconcile_moved(None).unwrap();

    let target = NormalizedPath::new(pair.target());
    let expected = MovePair::new(target.join("new_file.txt"), target.join("subdir/new_file.txt"));
    assert_eq!(failed, vec![expected.clone()]);
    assert_eq!(manager.report().unwrap().moved, vec![expected]);
    pair.assert_target_exists("new_file.txt");
    assert_eq!(pair.read_target("subdir/new_file.txt"), "blah");
}

#[test]
fn test_reconcile_moved_by_destination_path() {
    let pair = TreePair::standard();
    pair.rename_source("file1.txt", "subdir/file1.txt");
    let mut manager = scanned(&pair);

    let failed = manager
        .reconcile(Category::Moved, Some(&rel(&["subdir/file1.txt", "ghost.txt"])))
        .unwrap();

    assert_eq!(failed, rel(&["ghost.txt"]));
    pair.assert_target_exists("subdir/file1.txt");
    assert!(manager.report().unwrap().moved.is_empty());
}

#[test]
fn test_reconcile_dispatches_path_categories() {
    let pair = TreePair::standard();
    pair.write_target("stale.txt", "this is a removed file");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile(Category::Removed, None).unwrap();

    assert!(failed.is_empty());
    pair.assert_target_missing("stale.txt");
}

#[test]
fn test_reconcile_all_reaches_sync() {
    let pair = TreePair::standard();
    pair.rename_source("subdir", "newdir");
    pair.write_source("new_file.txt", "this is an added file");
    pair.edit_source("file1.txt", "this file changed");
    pair.write_target("stale.txt", "this is a removed file");
    let mut manager = scanned(&pair);

    let summary = manager.reconcile_all().unwrap();

    assert!(summary.is_complete(), "failures: {:?}", summary);
    assert_eq!(summary.applied, 4);
    pair.assert_target_exists("newdir/granddir/file3.txt");
    assert_eq!(pair.read_target("file1.txt"), "this file changed");
    pair.assert_target_missing("stale.txt");
    assert!(manager.rescan().unwrap().is_in_sync());
}

#[test]
fn test_changing_root_invalidates_report() {
    let pair = TreePair::standard();
    let mut manager = scanned(&pair);
    assert!(manager.is_scanned());

    // Same root again keeps the report
    manager.set_source_root(pair.source());
    assert!(manager.is_scanned());

    manager.set_target_root(pair.root().join("elsewhere"));
    assert!(!manager.is_scanned());
    assert!(matches!(
        manager.reconcile_removed(None),
        Err(Error::NotScanned)
    ));
}

#[test]
fn test_session_log_records_scan_and_actions() {
    let pair = TreePair::standard();
    pair.write_source("new_file.txt", "this is an added file");
    let log = MemoryLog::new();
    let mut manager = manager(&pair).with_log(Box::new(log.clone()));

    manager.scan(pair.source(), pair.target()).unwrap();
    manager.reconcile_added(None).unwrap();

    let kinds: Vec<&str> = log
        .events()
        .iter()
        .map(|event| match event {
            SessionEvent::RootsChanged { .. } => "roots",
            SessionEvent::ScanStarted { .. } => "started",
            SessionEvent::ScanCompleted { .. } => "completed",
            SessionEvent::ActionCompleted { .. } => "action",
        })
        .collect();
    assert_eq!(kinds, ["roots", "roots", "started", "completed", "action"]);

    let events = log.events();
    let Some(SessionEvent::ActionCompleted {
        category,
        requested,
        failed,
        ..
    }) = events.last()
    else {
        panic!("last event should be an action");
    };
    assert_eq!(*category, Category::Added);
    assert_eq!((*requested, *failed), (1, 0));
}

#[cfg(unix)]
#[test]
fn test_copy_added_file_with_backslash_in_name() {
    let pair = TreePair::standard();
    pair.write_source("a\\b.txt", "one name, not two");
    let mut manager = scanned(&pair);

    let failed = manager.reconcile_added(None).unwrap();

    assert!(failed.is_empty());
    assert_eq!(pair.read_target("a\\b.txt"), "one name, not two");
    assert!(!pair.target().join("a").exists());
    assert!(manager.rescan().unwrap().is_in_sync());
}
