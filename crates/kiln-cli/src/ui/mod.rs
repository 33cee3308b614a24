//! Terminal output: status lines and formatting helpers.
//!
//! ```no_run
//! use kiln_cli::ui;
//!
//! ui::init_colors();
//! ui::info("Building src/main.js");
//! ui::success("Build complete");
//! ```

mod format;
mod messages;

pub use format::{format_duration, format_size, print_outputs};
pub use messages::{debug, error, info, success, warning};
use messages::paint;

/// Whether stderr gets colors, for status lines and log events alike.
///
/// `NO_COLOR` disables colors and takes precedence over `FORCE_COLOR`;
/// otherwise an attended terminal decides.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Apply the color decision to `console` styling on stderr.
pub fn init_colors() {
    console::set_colors_enabled_stderr(should_use_color());
}
