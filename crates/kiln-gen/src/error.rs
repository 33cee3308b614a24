//! Error types for convention-driven code generation

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning convention directories or writing
/// generated modules
#[derive(Error, Debug, Diagnostic)]
pub enum GenError {
    /// Filesystem failure on a specific path
    #[error("I/O error on '{}': {source}", path.display())]
    #[diagnostic(code(kiln::gen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk failed part-way (permissions, vanished entries)
    #[error("Failed to scan '{}': {reason}", root.display())]
    #[diagnostic(code(kiln::gen::scan_failed))]
    ScanFailed { root: PathBuf, reason: String },

    /// A path handed to the generator is not inside the tree it was expected in
    #[error("Path '{}' is outside '{}'", path.display(), root.display())]
    #[diagnostic(code(kiln::gen::outside_root))]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

impl GenError {
    /// Create an Io error for `path`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the scanned directory does not exist.
    ///
    /// Callers treat a missing convention directory as "nothing to generate".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenError>;
