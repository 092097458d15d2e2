//! Remembered source/target root pair
//!
//! Stored as two lines, `source\ntarget\n`, with no escaping. A root
//! containing a line break cannot be represented and is refused.

use std::path::{Path, PathBuf};

use mirror_fs::{NormalizedPath, io};

use crate::error::{CliError, Result};

/// The last-used roots file
#[derive(Debug, Clone)]
pub struct LastRoots {
    path: NormalizedPath,
}

impl LastRoots {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: NormalizedPath::new(path),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// The remembered pair, if the file exists and holds two roots.
    pub fn load(&self) -> Result<Option<(PathBuf, PathBuf)>> {
        let Some(text) = io::read_text_if_exists(&self.path)? else {
            return Ok(None);
        };
        // `lines` drops the `\n` or `\r\n` terminator and nothing else
        let mut lines = text.lines().filter(|l| !l.is_empty());
        match (lines.next(), lines.next()) {
            (Some(source), Some(target)) => Ok(Some((PathBuf::from(source), PathBuf::from(target)))),
            _ => {
                tracing::warn!("Ignoring malformed roots file {}", self.path);
                Ok(None)
            }
        }
    }

    /// Remember `source` and `target`.
    pub fn save(&self, source: &Path, target: &Path) -> Result<()> {
        let source = source.to_string_lossy();
        let target = target.to_string_lossy();
        if source.contains(['\n', '\r']) || target.contains(['\n', '\r']) {
            return Err(CliError::user(
                "cannot remember a root whose path contains a line break",
            ));
        }
        io::write_text(&self.path, &format!("{}\n{}\n", source, target))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let roots = LastRoots::new(temp.path().join("mirror/last_roots.txt"));

        roots.save(Path::new("/music"), Path::new("/backup/music")).unwrap();

        assert_eq!(
            roots.load().unwrap(),
            Some((PathBuf::from("/music"), PathBuf::from("/backup/music")))
        );
        let text = std::fs::read_to_string(temp.path().join("mirror/last_roots.txt")).unwrap();
        assert_eq!(text, "/music\n/backup/music\n");
    }

    #[test]
    fn trailing_whitespace_in_root_survives() {
        let temp = TempDir::new().unwrap();
        let roots = LastRoots::new(temp.path().join("last_roots.txt"));

        roots.save(Path::new("/music "), Path::new("/backup\t")).unwrap();

        assert_eq!(
            roots.load().unwrap(),
            Some((PathBuf::from("/music "), PathBuf::from("/backup\t")))
        );
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_roots.txt");
        std::fs::write(&path, "/music\r\n/backup\r\n").unwrap();

        assert_eq!(
            LastRoots::new(&path).load().unwrap(),
            Some((PathBuf::from("/music"), PathBuf::from("/backup")))
        );
    }

    #[test]
    fn missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let roots = LastRoots::new(temp.path().join("last_roots.txt"));
        assert_eq!(roots.load().unwrap(), None);
    }

    #[test]
    fn single_line_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_roots.txt");
        std::fs::write(&path, "/music\n").unwrap();
        assert_eq!(LastRoots::new(&path).load().unwrap(), None);
    }

    #[test]
    fn newline_in_root_is_refused() {
        let temp = TempDir::new().unwrap();
        let roots = LastRoots::new(temp.path().join("last_roots.txt"));

        let err = roots
            .save(Path::new("/music\n/evil"), Path::new("/backup"))
            .unwrap_err();

        assert!(matches!(err, CliError::User { .. }));
        assert_eq!(roots.load().unwrap(), None);
    }
}
