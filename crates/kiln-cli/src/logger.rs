//! Logging setup for the kiln CLI.
//!
//! Every kiln crate reports through `tracing`; this module installs the one
//! subscriber the binary uses. `--verbose` enables debug events, `--quiet`
//! keeps errors only and otherwise `RUST_LOG` is honoured.
//!
//! ```rust,no_run
//! use kiln_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Starting build");
//! debug!(path = "src/pages/About.xht", "regenerating");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const KILN_CRATES: [&str; 4] = ["kiln_cli", "kiln_gen", "kiln_config", "kiln_plugin_template"];

/// Filter directive setting every kiln crate to `level`.
pub(crate) fn kiln_directive(level: &str) -> String {
    KILN_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber.
///
/// Call once, before any logging occurs.
///
/// The level is chosen in this order:
/// 1. `verbose`: DEBUG for kiln crates
/// 2. `quiet`: ERROR only
/// 3. `RUST_LOG`: custom filter
/// 4. Default: INFO for kiln crates
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(kiln_directive("debug"))
    } else if quiet {
        EnvFilter::new(kiln_directive("error"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(kiln_directive("info")))
    };

    init_logger_with_filter(filter, no_color);
}

/// Initialize logger with a custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .compact();

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
