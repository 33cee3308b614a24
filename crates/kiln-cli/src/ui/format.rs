//! Formatting for sizes, durations and build output listings.

use std::time::Duration;

use owo_colors::Style;

/// Size in the style esbuild prints after a build: `512b`, `1.5kb`, `2.0mb`.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(500), "500b");
/// assert_eq!(format_size(1536), "1.5kb");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{bytes}b")
    } else if size < KB * KB {
        format!("{:.1}kb", size / KB)
    } else {
        format!("{:.1}mb", size / (KB * KB))
    }
}

/// Human-readable duration: `ms` below a second, `s` below a minute, then `m s`.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// List written files with their sizes, names padded to one column.
pub fn print_outputs(files: &[(String, u64)], elapsed: Duration) {
    let width = files.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, size) in files {
        eprintln!(
            "  {}  {}",
            super::paint(&format!("{name:<width$}"), Style::new().bold()),
            super::paint(&format_size(*size), Style::new().cyan())
        );
    }
    eprintln!();
    let done = format!("done in {}", format_duration(elapsed));
    eprintln!("  {}", super::paint(&done, Style::new().dimmed()));
}
