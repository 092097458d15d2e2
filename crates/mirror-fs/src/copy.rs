//! Metadata-preserving copies

use std::fs::{self, File, FileTimes};
use std::path::Path;

use tracing::{debug, warn};

use crate::{Error, Result};

/// Copy a regular file, keeping permissions and timestamps.
///
/// The modification time is carried over so that a size/mtime comparison
/// of the two copies reports them as equal afterwards.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let metadata = fs::metadata(src).map_err(|e| Error::io(src, e))?;
    fs::copy(src, dst).map_err(|e| Error::io(dst, e))?;

    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    let file = File::options()
        .write(true)
        .open(dst)
        .map_err(|e| Error::io(dst, e))?;
    file.set_times(times).map_err(|e| Error::io(dst, e))?;
    Ok(())
}

/// Recursively copy the directory `src` to `dst`.
///
/// `dst` must not exist; its missing parents are created. Symlinks are
/// followed. Entries that are neither files nor directories are skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(Error::already_exists(dst));
    }
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;
    copy_tree_inner(src, dst)
}

fn copy_tree_inner(src: &Path, dst: &Path) -> Result<()> {
    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let metadata = fs::metadata(&from).map_err(|e| Error::io(&from, e))?;

        if metadata.is_dir() {
            fs::create_dir(&to).map_err(|e| Error::io(&to, e))?;
            copy_tree_inner(&from, &to)?;
        } else if metadata.is_file() {
            copy_file(&from, &to)?;
        } else {
            warn!("Skipping special file {}", from.display());
        }
    }
    debug!("Copied tree {} -> {}", src.display(), dst.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn copy_file_keeps_modification_time() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "content").unwrap();
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(stamp)
            .unwrap();

        copy_file(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "content");
        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), stamp);
    }

    #[test]
    fn copy_tree_copies_nested_entries() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("granddir")).unwrap();
        fs::write(src.join("file2.txt"), "two").unwrap();
        fs::write(src.join("granddir/file3.txt"), "three").unwrap();

        let dst = temp.path().join("out/copy");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("file2.txt")).unwrap(), "two");
        assert_eq!(
            fs::read_to_string(dst.join("granddir/file3.txt")).unwrap(),
            "three"
        );
    }

    #[test]
    fn copy_tree_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();

        let err = copy_tree(&src, &dst).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
    }
}
