//! Brisk CLI - watch, rebuild, serve and live-reload a TypeScript source tree.
//!
//! Parses arguments, initializes logging and dispatches to a command.

use brisk_cli::{cli, commands, error, logger, ui};
use clap::Parser;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = cli::Cli::parse();

    // Initialize logging and colors based on global flags
    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors();

    let result = match args.command {
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args).await,
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
    };

    // Fatal errors become miette reports and a non-zero exit
    result.map_err(error::cli_error_to_miette)
}
