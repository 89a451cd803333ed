//! Miette report conversion for CLI errors.

use crate::error::CliError;
use brisk_bundler::CompileError;
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Compile(e) => compile_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Discovery(e) => miette::miette!("Entry discovery failed: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert CompileError to miette Report, one diagnostic per line.
pub fn compile_error_to_miette(err: CompileError) -> Report {
    match err {
        CompileError::Failed { diagnostics } if !diagnostics.is_empty() => {
            let lines = diagnostics
                .iter()
                .map(|d| format!("  {}", d))
                .collect::<Vec<_>>()
                .join("\n");
            miette::miette!(
                "Compilation failed with {} error(s):\n{}",
                diagnostics.len(),
                lines
            )
        }
        CompileError::Init(message) => miette::miette!(
            "Failed to initialize compiler: {}\n\nHint: Check the 'target' setting (e.g. es2020, esnext)",
            message
        ),
        other => miette::miette!("{}", other),
    }
}
