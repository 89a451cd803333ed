//! Build command implementation.
//!
//! `brisk build` runs a single full cycle with production defaults and
//! commits it to the disk store.

use crate::cli::BuildArgs;
use crate::config::{BriskConfig, ConfigOverrides, Mode};
use crate::dev::{create_compiler, BuildSettings, CycleKind, CycleReport, DevBuilder};
use crate::error::{CliError, Result};
use crate::ui;
use brisk_store::DiskStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Execute the build command from the current working directory.
///
/// # Errors
///
/// Returns errors for:
/// - Invalid configuration, including `destination = "memory"`
/// - A missing source root
/// - Compile failures (nothing is written)
/// - File system errors while committing
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start_time = Instant::now();
    let cwd = std::env::current_dir()?;

    let report = build(&args, &cwd).await?;

    for warning in &report.warnings {
        ui::warning(&warning.to_string());
    }
    ui::print_build_summary(&report.outputs, start_time.elapsed());
    Ok(())
}

/// Load the production configuration relative to `cwd` and run one cycle.
pub async fn build(args: &BuildArgs, cwd: &Path) -> Result<CycleReport> {
    let config = BriskConfig::load(
        Mode::Production,
        &ConfigOverrides::from(args),
        args.config.as_deref(),
        cwd,
    )?;

    // Checked before validation so the message names the real problem
    let destination = config.destination_dir(cwd).ok_or_else(|| {
        CliError::InvalidArgument(
            "build needs a directory destination; \"memory\" is only available for dev"
                .to_string(),
        )
    })?;
    config.validate(cwd)?;

    let settings = BuildSettings::from_config(&config, cwd);
    ui::info(&format!(
        "Building {} -> {}",
        settings.source_root.display(),
        destination.display()
    ));

    let compiler = create_compiler(&config)?;
    let store = Arc::new(DiskStore::new(destination));
    let mut builder = DevBuilder::new(compiler, store, settings);

    builder
        .run_cycle(CycleKind::Full)
        .await
        .map_err(CliError::from)
}
