//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}\n\nHint: Create a kiln.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// The file or environment could not be parsed into a configuration
    #[error("Invalid configuration: {message}\n\nHint: {hint}")]
    Parse { message: String, hint: String },

    /// A field holds a value that parses but cannot be used
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            hint: hint.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        let hint = match &err.kind {
            figment::error::Kind::UnknownField(_, expected) => {
                format!("Known fields are: {}", expected.join(", "))
            }
            _ => "Check kiln.config.json syntax and field types".to_string(),
        };
        Self::Parse {
            message: err.to_string(),
            hint,
        }
    }
}
