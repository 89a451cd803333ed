//! The dev loop.
//!
//! Feeds watch events through the [`Debouncer`], lets the [`WatchController`]
//! decide when a cycle may start, runs each cycle on its own task and
//! broadcasts one reload per committed cycle.

use crate::dev::builder::{CycleFailure, CycleReport, DevBuilder};
use crate::dev::controller::{CycleKind, Debouncer, WatchController, WatchEvent};
use crate::dev::state::SharedState;
use crate::ui;
use brisk_bundler::CompileError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

type CycleResult = Result<CycleReport, CycleFailure>;

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles_started: u64,
    pub committed: u64,
    pub failed: u64,
}

enum Step {
    Event(WatchEvent),
    EventsClosed,
    Flush,
    Finished(Result<CycleResult, JoinError>),
    Shutdown,
}

/// Drives build cycles from watch events until shutdown.
#[derive(Debug)]
pub struct DevLoop {
    state: SharedState,
    builder: Arc<Mutex<DevBuilder>>,
    debouncer: Debouncer,
    controller: WatchController,
    in_flight: Option<JoinHandle<CycleResult>>,
    stats: LoopStats,
}

impl DevLoop {
    pub fn new(builder: DevBuilder, state: SharedState, debounce: Duration) -> Self {
        Self {
            state,
            builder: Arc::new(Mutex::new(builder)),
            debouncer: Debouncer::new(debounce),
            controller: WatchController::new(),
            in_flight: None,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Run the startup cycle before serving.
    ///
    /// A discovery failure is returned without being reported, since the
    /// caller treats it as fatal. Every other outcome is recorded like a
    /// watch-triggered cycle.
    pub async fn initial_build(&mut self) -> CycleResult {
        self.stats.cycles_started += 1;
        self.state.start_build();

        let result = self.builder.lock().await.run_cycle(CycleKind::Full).await;
        match &result {
            Ok(report) => self.committed(report),
            Err(CycleFailure::Discovery(e)) => {
                self.stats.failed += 1;
                self.state.fail_build(e.to_string());
            }
            Err(failure) => self.failed(failure),
        }
        result
    }

    /// Process watch events until `shutdown` resolves.
    ///
    /// A cycle in flight at shutdown is allowed to finish so the store is
    /// never left mid-commit.
    pub async fn run<F>(mut self, mut events: mpsc::Receiver<WatchEvent>, shutdown: F) -> LoopStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut events_open = true;

        loop {
            let deadline = self.debouncer.deadline();
            let step = tokio::select! {
                biased;
                _ = &mut shutdown => Step::Shutdown,
                joined = join_cycle(&mut self.in_flight) => Step::Finished(joined),
                // Ahead of events so a steady stream cannot hold off the max delay
                _ = sleep_until(deadline) => Step::Flush,
                event = events.recv(), if events_open => match event {
                    Some(event) => Step::Event(event),
                    None => Step::EventsClosed,
                },
            };

            match step {
                Step::Event(event) => {
                    let path = event.path.clone();
                    if !self.debouncer.push(event, Instant::now()) {
                        tracing::trace!("Ignoring {}", path.display());
                    }
                }
                Step::EventsClosed => {
                    events_open = false;
                    ui::warning("File watcher stopped; changes will no longer trigger rebuilds");
                }
                Step::Flush => self.flush(),
                Step::Finished(joined) => {
                    self.in_flight = None;
                    self.finish(joined);
                    if let Some(next) = self.controller.on_cycle_complete() {
                        tracing::debug!("Running deferred {} cycle", next);
                        self.start(next);
                    }
                }
                Step::Shutdown => {
                    if let Some(handle) = self.in_flight.take() {
                        ui::info("Waiting for the current build to finish...");
                        let joined = handle.await;
                        self.finish(joined);
                    }
                    break;
                }
            }
        }

        self.stats
    }

    fn flush(&mut self) {
        let Some(trigger) = self.debouncer.take_ready(Instant::now()) else {
            return;
        };

        match trigger.paths.as_slice() {
            [single] => ui::info(&format!("File changed: {}", single.display())),
            paths => ui::info(&format!("{} files changed", paths.len())),
        }

        match self.controller.on_trigger(trigger.kind) {
            Some(kind) => self.start(kind),
            None => tracing::debug!("Build in progress; {} cycle deferred", trigger.kind),
        }
    }

    fn start(&mut self, kind: CycleKind) {
        self.stats.cycles_started += 1;
        self.state.start_build();

        let builder = Arc::clone(&self.builder);
        self.in_flight = Some(tokio::spawn(async move {
            builder.lock().await.run_cycle(kind).await
        }));
    }

    fn finish(&mut self, joined: Result<CycleResult, JoinError>) {
        match joined {
            Ok(Ok(report)) => self.committed(&report),
            Ok(Err(failure)) => self.failed(&failure),
            Err(e) => {
                self.stats.failed += 1;
                self.state.fail_build(e.to_string());
                ui::error(&format!("Build task aborted: {}", e));
            }
        }
    }

    fn committed(&mut self, report: &CycleReport) {
        self.stats.committed += 1;
        self.state.complete_build(report.duration_ms());

        for warning in &report.warnings {
            ui::warning(&warning.to_string());
        }
        ui::success(&format!(
            "Rebuilt {} ({} entries, {} written, {} removed) in {}",
            report.kind,
            report.entries,
            report.commit.written,
            report.commit.removed,
            ui::format_duration(report.duration)
        ));

        self.state.broadcaster.broadcast();
    }

    fn failed(&mut self, failure: &CycleFailure) {
        self.stats.failed += 1;
        self.state.fail_build(failure.to_string());

        match failure {
            CycleFailure::Compile(CompileError::Failed { diagnostics }) => {
                ui::error(&format!(
                    "Build failed with {} error(s); serving the last good build",
                    diagnostics.len()
                ));
                for diagnostic in diagnostics {
                    ui::error(&format!("  {}", diagnostic));
                }
            }
            other => ui::error(&format!("Build failed: {}; serving the last good build", other)),
        }
    }
}

async fn join_cycle(handle: &mut Option<JoinHandle<CycleResult>>) -> Result<CycleResult, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
