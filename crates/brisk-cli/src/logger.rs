//! Logging setup for the Brisk CLI.
//!
//! Installs a `tracing` subscriber with an `EnvFilter` and a compact
//! formatter. Status lines meant for the operator go through [`crate::ui`];
//! everything else is a tracing event.
//!
//! # Example
//!
//! ```rust,no_run
//! use brisk_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Starting dev server");
//! debug!("Compiling {}", "index.ts");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "brisk=debug,brisk_bundler=debug,brisk_store=debug,brisk_cli=debug,brisk_plugin_css=debug";
const QUIET_FILTER: &str = "brisk=error,brisk_bundler=error,brisk_store=error,brisk_cli=error";
const DEFAULT_FILTER: &str = "brisk=info,brisk_bundler=info,brisk_store=info,brisk_cli=info";

/// Build the filter for the given flags.
///
/// Precedence: `--verbose`, then `--quiet`, then `RUST_LOG`, then info for
/// the brisk crates.
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at the start of the program. `verbose` wins over `quiet`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .with_writer(std::io::stderr)
        .compact();

    // A second init (e.g. from tests) is not an error worth surfacing
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}

/// Check if colored output should be enabled.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them, otherwise the
/// terminal's capabilities decide.
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}
