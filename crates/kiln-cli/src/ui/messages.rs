//! Status lines printed to stderr.
//!
//! Styling is skipped entirely once [`super::init_colors`] has turned colors
//! off for stderr.

use owo_colors::{OwoColorize, Style};

pub(super) fn paint(text: &str, style: Style) -> String {
    if console::colors_enabled_stderr() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// `✓ message`
pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

/// `ℹ message`
pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

/// `⚠ message`, in yellow.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("⚠", Style::new().yellow().bold()),
        paint(message, Style::new().yellow())
    );
}

/// `✗ message`, in red.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", Style::new().red().bold()),
        paint(message, Style::new().red())
    );
}

/// Dimmed line, only printed when `RUST_LOG` is set.
pub fn debug(message: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        let style = Style::new().dimmed();
        eprintln!("{} {}", paint("◆", style), paint(message, style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_paint_respects_console_switch() {
        console::set_colors_enabled_stderr(false);
        assert_eq!(paint("✓", Style::new().green()), "✓");

        console::set_colors_enabled_stderr(true);
        assert_ne!(paint("✓", Style::new().green()), "✓");
    }

    #[test]
    fn test_status_messages() {
        success("Build complete");
        info("Watching src");
        warning("Unknown bundler option");
        error("Build failed");
        debug("batch of 3 events");
    }
}
