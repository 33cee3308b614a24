//! Directory scanning for convention trees.
//!
//! Scans are stateless and recomputed on every call. Output order is explicit
//! (depth first, then relative path) so generated files are identical across
//! platforms regardless of the order the OS lists directory entries.

use crate::error::{GenError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A single entry discovered under a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute (or caller-rooted) path of the entry
    pub absolute_path: PathBuf,
    /// Path relative to the scanned directory
    pub relative_path: PathBuf,
    /// Whether the entry is a directory
    pub is_directory: bool,
}

impl FileEntry {
    /// Number of path components below the scan root (1 for direct children).
    pub fn depth(&self) -> usize {
        self.relative_path.components().count()
    }

    /// Relative path rendered with forward slashes.
    pub fn relative_slash_path(&self) -> String {
        to_slash(&self.relative_path)
    }

    /// Final path component as UTF-8, if representable.
    pub fn file_name(&self) -> Option<&str> {
        self.relative_path.file_name().and_then(|n| n.to_str())
    }
}

/// Whether any component of a relative path starts with `.`.
pub fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

/// List visible entries under `dir`.
///
/// With `recursive` false only direct children are returned. Hidden entries
/// (leading `.`) are skipped and hidden directories are not descended into;
/// `dir` itself may be hidden. Symlinked
/// directories are never descended into, which rules out cycles; symlinks
/// that resolve to regular files are reported as files.
///
/// # Errors
///
/// Returns [`GenError::Io`] if `dir` does not exist or is not a directory, and
/// [`GenError::ScanFailed`] if the walk fails part-way.
pub fn scan(dir: &Path, recursive: bool) -> Result<Vec<FileEntry>> {
    let metadata = std::fs::metadata(dir).map_err(|e| GenError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(GenError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut entries = Vec::new();

    let walk = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for item in walk {
        let item = item.map_err(|e| GenError::ScanFailed {
            root: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let file_type = item.file_type();
        let is_directory = if file_type.is_symlink() {
            match std::fs::metadata(item.path()) {
                Ok(target) if target.is_file() => false,
                _ => {
                    tracing::debug!(path = %item.path().display(), "skipping symlink");
                    continue;
                }
            }
        } else {
            file_type.is_dir()
        };

        let relative_path = item
            .path()
            .strip_prefix(dir)
            .map_err(|_| GenError::OutsideRoot {
                path: item.path().to_path_buf(),
                root: dir.to_path_buf(),
            })?
            .to_path_buf();

        entries.push(FileEntry {
            absolute_path: item.path().to_path_buf(),
            relative_path,
            is_directory,
        });
    }

    entries.sort_by(|a, b| {
        a.depth()
            .cmp(&b.depth())
            .then_with(|| a.relative_slash_path().cmp(&b.relative_slash_path()))
    });

    Ok(entries)
}

/// Like [`scan`], but a missing directory yields an empty listing.
pub fn scan_or_empty(dir: &Path, recursive: bool) -> Result<Vec<FileEntry>> {
    match scan(dir, recursive) {
        Err(err) if err.is_not_found() => {
            tracing::debug!(dir = %dir.display(), "directory missing, nothing to scan");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Render a path with `/` separators.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_scan_missing_directory_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = scan(&temp.path().join("nope"), true).unwrap_err();
        assert!(err.is_not_found());
        assert!(scan_or_empty(&temp.path().join("nope"), true).unwrap().is_empty());
    }

    #[test]
    fn test_scan_orders_by_depth_then_path() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b/Deep.xht");
        touch(temp.path(), "Zed.xht");
        touch(temp.path(), "a/x/y.xht");
        touch(temp.path(), "About.xht");

        let entries = scan(temp.path(), true).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.relative_slash_path()).collect();
        assert_eq!(
            paths,
            vec!["About.xht", "Zed.xht", "a", "b", "a/x", "b/Deep.xht", "a/x/y.xht"]
        );
        assert!(entries[2].is_directory);
        assert!(!entries[0].is_directory);
    }

    #[test]
    fn test_scan_non_recursive_lists_children_only() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Button.xht");
        touch(temp.path(), "forms/Input.xht");

        let entries = scan(temp.path(), false).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.relative_slash_path()).collect();
        assert_eq!(paths, vec!["Button.xht", "forms"]);
    }

    #[test]
    fn test_scan_skips_hidden_entries_and_their_contents() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join(".cache-root");
        touch(&root, "Home.xht");
        touch(&root, ".env");
        touch(&root, ".drafts/Secret.xht");
        touch(&root, "blog/.notes/Idea.xht");

        let entries = scan(&root, true).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.relative_slash_path()).collect();
        assert_eq!(paths, vec!["Home.xht", "blog"]);
    }

    #[test]
    fn test_is_hidden_checks_every_component() {
        assert!(is_hidden(Path::new(".drafts/Secret.xht")));
        assert!(is_hidden(Path::new("blog/.notes")));
        assert!(!is_hidden(Path::new("blog/Post.xht")));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_does_not_follow_symlinked_directories() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "pages/Home.xht");
        std::os::unix::fs::symlink(temp.path().join("pages"), temp.path().join("pages/loop"))
            .unwrap();

        let entries = scan(&temp.path().join("pages"), true).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.relative_slash_path()).collect();
        assert_eq!(paths, vec!["Home.xht"]);
    }
}
