//! Subcommand argument structs.
//!
//! Every option is optional so that only flags actually passed on the command
//! line override `brisk.config.json` and `BRISK_*` variables.

use super::enums::StylesheetMode;
use super::validation::parse_port;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the development server with watch and live reload
    ///
    /// Runs an initial build, serves the artifacts, then rebuilds on every
    /// relevant change and notifies connected browsers once the rebuild has
    /// been committed.
    Dev(DevArgs),

    /// Run a single production build and exit
    ///
    /// Minifies by default and writes the artifacts to the destination
    /// directory. Exits non-zero if compilation fails.
    Build(BuildArgs),
}

/// Arguments for the dev command
#[derive(Args, Debug, Default, Clone)]
pub struct DevArgs {
    /// Directory scanned for entries (default: ./src)
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Output directory, or "memory" to keep artifacts in process
    #[arg(short, long, value_name = "DIR|memory")]
    pub destination: Option<String>,

    /// Port for the development server (default: 8080)
    ///
    /// If the port is taken the server exits with an error rather than
    /// picking another one.
    #[arg(short, long, value_name = "PORT", value_parser = parse_port)]
    pub port: Option<u16>,

    /// Host address to bind (default: 127.0.0.1)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Build and serve once without watching for changes
    #[arg(long)]
    pub no_watch: bool,

    /// Minify scripts and stylesheets
    #[arg(long)]
    pub minify: bool,

    /// Do not emit source maps
    #[arg(long)]
    pub no_sourcemap: bool,

    /// How stylesheet imports inside entries are compiled
    #[arg(long, value_enum, value_name = "MODE")]
    pub stylesheets: Option<StylesheetMode>,

    /// Discover entries in subdirectories of the source root
    #[arg(short, long)]
    pub recursive: bool,

    /// Path to a configuration file (default: ./brisk.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Open the browser once the server is up
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the build command
#[derive(Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// Directory scanned for entries (default: ./src)
    #[arg(long, value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Output directory (default: ./dist)
    #[arg(short, long, value_name = "DIR")]
    pub destination: Option<String>,

    /// Skip minification
    #[arg(long)]
    pub no_minify: bool,

    /// Emit source maps
    #[arg(long)]
    pub sourcemap: bool,

    /// How stylesheet imports inside entries are compiled
    #[arg(long, value_enum, value_name = "MODE")]
    pub stylesheets: Option<StylesheetMode>,

    /// Discover entries in subdirectories of the source root
    #[arg(short, long)]
    pub recursive: bool,

    /// Path to a configuration file (default: ./brisk.config.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
