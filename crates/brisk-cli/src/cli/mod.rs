//! Command-line interface definition for Brisk.
//!
//! # Command Structure
//!
//! - `brisk dev` - Initial build, then serve, watch, rebuild and live-reload
//! - `brisk build` - One production build cycle committed to disk

mod commands;
pub mod enums;
mod tests;
mod validation;

use clap::Parser;

pub use commands::{BuildArgs, Command, DevArgs};
pub use enums::*;
pub use validation::parse_port;

/// Brisk - watch, rebuild, serve and live-reload a TypeScript source tree
#[derive(Parser, Debug)]
#[command(
    name = "brisk",
    version,
    about = "Watch, rebuild, serve and live-reload a TypeScript source tree",
    long_about = "Brisk compiles every entry in a source directory, serves the artifacts over HTTP,\n\
                  and tells connected browsers to reload once a rebuild has fully completed.\n\
                  A failed rebuild never replaces the last good artifacts."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
