//! Development server command implementation.
//!
//! Orchestrates the dev server lifecycle:
//! - File watching, started before anything is compiled
//! - Initial build (a missing source root is fatal, compile errors are not)
//! - HTTP server with the live-reload push channel
//! - Debounced rebuilds and one reload per committed cycle
//! - Shutdown on Ctrl+C

use crate::cli::DevArgs;
use crate::dev::{
    create_compiler, BuildSettings, CycleFailure, DevBuilder, DevConfig, DevLoop, DevServer,
    DevServerState, FileWatcher,
};
use crate::error::Result;
use crate::ui;
use brisk_store::{ArtifactStore, DiskStore, MemoryStore};
use std::sync::Arc;
use tokio::signal;

/// Execute the dev command.
///
/// # Process Flow
///
/// 1. Load and validate configuration
/// 2. Build the compiler and pick the artifact store backend
/// 3. Bind the serving port
/// 4. Start the watcher, so edits made during the initial build queue a cycle
/// 5. Run the initial build
/// 6. Serve and rebuild until Ctrl+C
///
/// # Errors
///
/// Returns errors for:
/// - Invalid configuration
/// - Compiler initialization failures
/// - A port that cannot be bound
/// - A missing source root at startup
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    // Step 1: Load and validate configuration
    let cwd = std::env::current_dir()?;
    let config = DevConfig::from_args(&args, &cwd)?;
    ui::info(&format!("Source root: {}", config.source_root.display()));

    // Step 2: Compiler and store
    let compiler = create_compiler(&config.base)?;
    let store: Arc<dyn ArtifactStore> = match &config.destination {
        Some(dir) => {
            ui::info(&format!("Writing artifacts to {}", dir.display()));
            Arc::new(DiskStore::new(dir))
        }
        None => {
            ui::info("Keeping artifacts in memory");
            Arc::new(MemoryStore::new())
        }
    };
    let state = Arc::new(DevServerState::new(
        Arc::clone(&store),
        config.base.root_document.clone(),
    ));

    // Step 3: Bind before building so a taken port fails fast
    let server = DevServer::bind(config.addr).await?;

    // Step 4: Watch first; events wait in the channel until the loop runs
    let watching = if config.base.watch {
        let (watcher, events) =
            FileWatcher::new(config.source_root.clone(), config.watch_ignore.clone())?;
        ui::info(&format!("Watching for changes in {}", watcher.root().display()));
        Some((watcher, events))
    } else {
        None
    };

    // Step 5: Initial build
    let settings = BuildSettings::from_config(&config.base, &config.cwd);
    let builder = DevBuilder::new(compiler, store, settings);
    let mut dev_loop = DevLoop::new(builder, Arc::clone(&state), config.base.debounce());

    ui::info("Performing initial build...");
    match dev_loop.initial_build().await {
        Ok(_) => {}
        Err(CycleFailure::Discovery(e)) => return Err(e.into()),
        Err(_) => ui::warning("Initial build failed; fix the errors above and save to rebuild"),
    }

    // Step 6: Serve
    let mut server_task = tokio::spawn(server.serve(Arc::clone(&state)));
    let url = config.server_url();
    ui::success(&format!("Serving at {}", url));

    if config.open {
        open_browser(&url);
    }

    let shutdown = async {
        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            result = &mut server_task => match result {
                Ok(Ok(())) => ui::warning("Server task completed unexpectedly"),
                Ok(Err(e)) => ui::error(&e.to_string()),
                Err(e) => ui::error(&format!("Server task failed: {}", e)),
            },
        }
    };

    let stats = if let Some((watcher, events)) = watching {
        ui::info("Press Ctrl+C to stop");
        let stats = dev_loop.run(events, shutdown).await;
        drop(watcher);
        stats
    } else {
        ui::info("Watching disabled. Press Ctrl+C to stop");
        shutdown.await;
        dev_loop.stats()
    };

    server_task.abort();
    ui::success(&format!(
        "Development server stopped ({} build(s), {} failed)",
        stats.committed, stats.failed
    ));
    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    ui::info("Shutting down development server...");
}

/// Open the server URL in the default browser.
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_invalid_destination_fails_before_binding() {
        let temp = TempDir::new().unwrap();
        let args = DevArgs {
            source_root: Some(temp.path().to_path_buf()),
            destination: Some(temp.path().join("dist").display().to_string()),
            port: Some(1),
            ..DevArgs::default()
        };
        // The destination sits inside the source root
        let err = DevConfig::from_args(&args, temp.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn test_destination_over_source_root_fails_before_binding() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("src")).unwrap();
        let args = DevArgs {
            source_root: Some(temp.path().join("src")),
            destination: Some(".".to_string()),
            port: Some(1),
            ..DevArgs::default()
        };

        let err = DevConfig::from_args(&args, temp.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
