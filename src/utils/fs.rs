// imgchain/src/utils/fs.rs
use crate::core::Result;
use std::path::Path;

/// Filesystem side effects shared by the sequencer and the batch
/// coordinator. Construct one and pass it by reference.
#[derive(Debug, Clone, Default)]
pub struct FileManager;

impl FileManager {
    pub fn new() -> Self {
        Self
    }

    /// Creates `dir` and any missing ancestors. Succeeds if it already exists.
    pub fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            log::debug!("Creating directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.ensure_dir(parent),
            _ => Ok(()),
        }
    }

    /// Copies `from` to `to`. Copying a file onto itself leaves it as is.
    pub fn copy(&self, from: &Path, to: &Path) -> Result<u64> {
        if self.same_file(from, to) {
            log::debug!("{} is already in place, not copying", from.display());
            return self.file_size(from);
        }
        log::debug!("Copying {} to {}", from.display(), to.display());
        Ok(std::fs::copy(from, to)?)
    }

    /// Whether both paths exist and name the same file once canonicalized.
    pub fn same_file(&self, a: &Path, b: &Path) -> bool {
        match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    pub fn file_size(&self, path: &Path) -> Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    /// Removes a file, logging instead of failing.
    pub fn remove_quietly(&self, path: &Path) {
        if !path.exists() {
            return;
        }
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Removed temporary file {}", path.display()),
            Err(e) => log::warn!(
                "Failed to clean up temporary file {}: {}",
                path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/c");
        let files = FileManager::new();

        files.ensure_dir(&nested).unwrap();
        files.ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn remove_quietly_ignores_missing_files() {
        let tmp = TempDir::new().unwrap();
        let files = FileManager::new();
        files.remove_quietly(&tmp.path().join("missing.temp.convert"));

        let present = tmp.path().join("present.temp.resize");
        std::fs::write(&present, b"x").unwrap();
        files.remove_quietly(&present);
        assert!(!present.exists());
    }

    #[test]
    fn copy_reports_bytes_written() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("in.png");
        let to = tmp.path().join("out.png");
        std::fs::write(&from, b"12345").unwrap();

        let files = FileManager::new();
        assert_eq!(files.copy(&from, &to).unwrap(), 5);
        assert_eq!(files.file_size(&to).unwrap(), 5);
    }

    #[test]
    fn copy_onto_itself_keeps_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("photo.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();
        let files = FileManager::new();

        let aliased = tmp.path().join(".").join("photo.jpg");
        assert_eq!(files.copy(&path, &aliased).unwrap(), 10);
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn same_file_requires_both_to_exist() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();
        let files = FileManager::new();

        std::fs::create_dir(tmp.path().join("d")).unwrap();
        assert!(files.same_file(&path, &tmp.path().join("d/../a.png")));
        assert!(!files.same_file(&path, &tmp.path().join("b.png")));
    }
}
