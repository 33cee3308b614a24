//! Kiln CLI entry point.
//!
//! Handles argument parsing, logging initialization and mode dispatch.

use clap::Parser;
use kiln_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse_from(cli::normalize_legacy_args(std::env::args_os()));

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors();

    let result = match args.mode() {
        cli::Mode::Build => commands::build_execute(&args).await,
        cli::Mode::Dev => commands::dev_execute(&args).await,
        cli::Mode::Serve => commands::serve_execute(&args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
