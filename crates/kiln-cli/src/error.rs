//! Error handling for the kiln CLI.
//!
//! `CliError` is what every command returns. Domain errors convert into it
//! through `#[from]`, and messages end with a `Hint:` whenever there is a
//! concrete next step for the user.
//!
//! ```rust,no_run
//! use kiln_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_index(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Create index.html in the output directory")
//! }
//! ```

mod miette;

use std::path::PathBuf;

use thiserror::Error;

pub use self::miette::{build_error_to_miette, cli_error_to_miette};
pub use kiln_config::ConfigError;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or validating `kiln.config.json`
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bundling or writing the output
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// A flag or config value that cannot be used as given
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dev server errors
    #[error("Server error: {0}")]
    Server(String),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Message already carrying its context or hint
    #[error("{0}")]
    Custom(String),
}

/// Build process errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Entry module doesn't exist
    #[error("Entry point not found: {}\n\nHint: Create it or set 'entry' in kiln.config.json", .0.display())]
    EntryNotFound(PathBuf),

    /// Rolldown rejected the options or failed to bundle
    #[error("{0}")]
    Bundler(String),

    /// A `bundler` override has the wrong shape
    #[error("Invalid bundler option '{key}': {value}\n\nHint: {hint}")]
    InvalidOverride {
        key: String,
        value: String,
        hint: String,
    },

    /// Writing an output file failed
    #[error("Failed to write {}: {source}\n\nHint: Check output directory permissions", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file name would land outside the output directory
    #[error("Refusing to write '{0}' outside the output directory")]
    OutsideOutdir(String),
}

impl BuildError {
    /// Wrap a rolldown diagnostic batch.
    pub(crate) fn bundler(diagnostics: &dyn std::fmt::Debug) -> Self {
        BuildError::Bundler(format!("Bundling failed: {diagnostics:?}"))
    }
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a `Hint:` line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message with `msg`.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{err}\n\nHint: {hint}"))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{msg}: {err}"))
        })
    }
}
