use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a template into JavaScript.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler process could not be started
    #[error("Failed to start template compiler '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler ran and reported an error
    #[error("Template compiler failed on {}{}:\n{stderr}", path.display(), status.map(|c| format!(" (exit code {c})")).unwrap_or_default())]
    Failed {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    /// The compiler printed something that is not a compile result
    #[error("Template compiler returned malformed output for {}: {source}", path.display())]
    InvalidOutput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Talking to the compiler process failed
    #[error("I/O error while compiling {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CompileError>;
