//! Conversion of CLI errors into miette reports for the final exit message.

use ::miette::Report;

use crate::error::{BuildError, CliError};

/// Convert a `CliError` into a miette `Report`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => ::miette::miette!("Configuration error: {}", e),
        _ => ::miette::miette!("{}", err),
    }
}

/// Convert a `BuildError` into a miette `Report`.
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::Bundler(message) => ::miette::miette!(
            help = "Fix the module named above; template compiler errors include the compiler's stderr",
            "{}",
            message
        ),
        _ => ::miette::miette!("{}", err),
    }
}
