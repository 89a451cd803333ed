//! Formatting for sizes, durations and the build summary table.

use console::Term;
use owo_colors::OwoColorize;
use std::time::Duration;

/// Format a byte count as `B`, `KB`, `MB` or `GB`.
///
/// ```
/// use brisk_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format a duration as milliseconds, seconds, or minutes and seconds.
///
/// ```
/// use std::time::Duration;
/// use brisk_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print `(file name, size)` rows for a build, followed by a total.
///
/// ```no_run
/// use std::time::Duration;
/// use brisk_cli::ui::print_build_summary;
///
/// print_build_summary(
///     &[("index.js".to_string(), 15_234), ("index.html".to_string(), 812)],
///     Duration::from_millis(450),
/// );
/// ```
pub fn print_build_summary(outputs: &[(String, u64)], elapsed: Duration) {
    let width = (Term::stderr().size().1 as usize).min(80);

    eprintln!("\n{}", "Build Summary".bold().underline());
    eprintln!("{}", "─".repeat(width));

    for (name, size) in outputs {
        eprintln!(
            "  {} {} {}",
            "▸".blue(),
            name.bright_white().bold(),
            format_size(*size).dimmed(),
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total_size: u64 = outputs.iter().map(|(_, size)| size).sum();
    eprintln!(
        "  {} {} artifact(s), {} in {}",
        "Total:".bold(),
        outputs.len(),
        format_size(total_size).green(),
        format_duration(elapsed).green()
    );
}
