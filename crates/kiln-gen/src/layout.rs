//! Where convention directories and generated files live in a project.

use crate::convention::{ConventionDir, Conventions};
use std::path::{Path, PathBuf};

/// File name of the generated route table inside the source root.
pub const ROUTES_FILE: &str = "routes.js";

/// Resolved locations for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Source root containing the convention directories (usually `<project>/src`)
    pub src_root: PathBuf,
    /// Naming rules
    pub conventions: Conventions,
}

impl ProjectLayout {
    /// Layout rooted at `src_root` with default conventions.
    pub fn new(src_root: impl Into<PathBuf>) -> Self {
        Self {
            src_root: src_root.into(),
            conventions: Conventions::default(),
        }
    }

    /// Replace the naming rules.
    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Root of a convention tree.
    pub fn dir(&self, dir: ConventionDir) -> PathBuf {
        self.src_root.join(dir.dir_name())
    }

    /// Path of the generated route table.
    pub fn routes_file(&self) -> PathBuf {
        self.src_root.join(ROUTES_FILE)
    }

    /// Path of the barrel for `dir`.
    pub fn barrel_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.conventions.barrel_file)
    }

    /// Which convention tree `path` belongs to, with the tree root.
    ///
    /// The convention root itself is reported as belonging to its tree.
    pub fn locate(&self, path: &Path) -> Option<(ConventionDir, PathBuf)> {
        ConventionDir::ALL.into_iter().find_map(|dir| {
            let root = self.dir(dir);
            path.starts_with(&root).then_some((dir, root))
        })
    }

    /// Whether `path` lies in, or is, a hidden entry below the source root.
    ///
    /// Paths outside the source root are never hidden.
    pub fn is_hidden(&self, path: &Path) -> bool {
        path.strip_prefix(&self.src_root)
            .is_ok_and(crate::scanner::is_hidden)
    }

    /// Whether `path` is a file written by the generator.
    pub fn is_generated(&self, path: &Path) -> bool {
        path == self.routes_file()
            || (self.locate(path).is_some() && self.conventions.is_generated(path))
    }
}
