//! Persistence of generated modules.

use crate::error::{GenError, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Result of a [`ModuleWriter::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New content reached the disk
    Written,
    /// The file already held exactly this content
    Unchanged,
}

/// Writes generated files with unconditional-overwrite semantics.
///
/// Identical content is detected up front and skipped, so regenerating an
/// unchanged tree does not touch mtimes or wake file watchers. A crash
/// mid-write can leave a truncated file; the next regeneration pass rewrites it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleWriter;

impl ModuleWriter {
    /// Create a writer.
    pub fn new() -> Self {
        Self
    }

    /// Write `content` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Any filesystem failure is returned as [`GenError::Io`] for `path`; the
    /// file handle is closed on every path out of this function.
    pub fn write(&self, path: &Path, content: &str) -> Result<WriteOutcome> {
        if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
            tracing::trace!(path = %path.display(), "generated file unchanged");
            return Ok(WriteOutcome::Unchanged);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GenError::io(parent, e))?;
        }

        let mut file = fs::File::create(path).map_err(|e| GenError::io(path, e))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| GenError::io(path, e))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "wrote generated file");
        Ok(WriteOutcome::Written)
    }

    /// Create `path` with `content` only if nothing exists there yet.
    ///
    /// Returns `true` when the file was created.
    pub fn create_if_absent(&self, path: &Path, content: &str) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        self.write(path, content)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents_and_reports_outcome() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("src/pages/index.js");
        let writer = ModuleWriter::new();

        assert_eq!(writer.write(&path, "a\n").unwrap(), WriteOutcome::Written);
        assert_eq!(writer.write(&path, "a\n").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(writer.write(&path, "b\n").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "b\n");
    }

    #[test]
    fn test_write_failure_is_io_error_with_path() {
        let temp = TempDir::new().unwrap();
        // A regular file where a directory is expected
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = ModuleWriter::new()
            .write(&blocker.join("routes.js"), "x")
            .unwrap_err();
        assert!(matches!(err, GenError::Io { .. }));
    }

    #[test]
    fn test_create_if_absent_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("+home.xht");
        fs::write(&path, "mine").unwrap();

        assert!(!ModuleWriter::new().create_if_absent(&path, "stub").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "mine");
    }
}
