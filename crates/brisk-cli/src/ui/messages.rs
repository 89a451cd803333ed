//! One-line status messages on stderr.
//!
//! Every line is a glyph followed by the message, so a rebuild log can be
//! scanned by its left column:
//!
//! ```text
//! ℹ File changed: src/index.ts
//! ✗ Build failed with 1 error(s); serving the last good build
//! ✓ Rebuilt 3 artifact(s) in 41ms
//! ```
//!
//! stdout is never touched. Color follows the decision made by
//! [`init_colors`](super::init_colors), which also covers `NO_COLOR`.

use owo_colors::{OwoColorize, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Info,
    Warning,
    Error,
    Debug,
}

impl Level {
    fn glyph(self) -> &'static str {
        match self {
            Level::Success => "✓",
            Level::Info => "ℹ",
            Level::Warning => "⚠",
            Level::Error => "✗",
            Level::Debug => "◆",
        }
    }

    fn glyph_style(self) -> Style {
        match self {
            Level::Success => Style::new().green().bold(),
            Level::Info => Style::new().blue().bold(),
            Level::Warning => Style::new().yellow().bold(),
            Level::Error => Style::new().red().bold(),
            Level::Debug => Style::new().dimmed(),
        }
    }

    /// Style for the message body. Success and info keep the terminal default.
    fn body_style(self) -> Option<Style> {
        match self {
            Level::Warning => Some(Style::new().yellow()),
            Level::Error => Some(Style::new().red()),
            Level::Debug => Some(Style::new().dimmed()),
            Level::Success | Level::Info => None,
        }
    }
}

fn render(level: Level, message: &str, colored: bool) -> String {
    if !colored {
        return format!("{} {}", level.glyph(), message);
    }

    let glyph_text = level.glyph();
    let glyph = glyph_text.style(level.glyph_style());
    match level.body_style() {
        Some(style) => format!("{} {}", glyph, message.style(style)),
        None => format!("{} {}", glyph, message),
    }
}

fn emit(level: Level, message: &str) {
    eprintln!(
        "{}",
        render(level, message, console::colors_enabled_stderr())
    );
}

/// Report something that finished well: a commit, a bound port, a stop.
///
/// ```no_run
/// use brisk_cli::ui::success;
///
/// success("Build completed");
/// ```
pub fn success(message: &str) {
    emit(Level::Success, message);
}

pub fn info(message: &str) {
    emit(Level::Info, message);
}

/// Recoverable trouble. The whole line is tinted, not just the glyph.
pub fn warning(message: &str) {
    emit(Level::Warning, message);
}

/// Print an error line.
///
/// Fatal errors reach the user through the miette report in `main`; this is
/// for failures the process survives, such as a broken rebuild.
///
/// ```no_run
/// use brisk_cli::ui::error;
///
/// error("Rebuild failed; still serving the previous artifacts");
/// ```
pub fn error(message: &str) {
    emit(Level::Error, message);
}

/// Print a dimmed line, but only while `RUST_LOG` is set.
pub fn debug(message: &str) {
    if debug_enabled() {
        emit(Level::Debug, message);
    }
}

fn debug_enabled() -> bool {
    std::env::var_os("RUST_LOG").is_some()
}
