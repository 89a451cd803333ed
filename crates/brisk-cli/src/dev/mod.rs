//! Development server.
//!
//! - [`watcher`] turns filesystem notifications into watch events
//! - [`controller`] debounces them and schedules at most one build cycle
//! - [`builder`] compiles, derives markup and commits to the artifact store
//! - [`server`] serves the store and the live-reload channel
//! - [`orchestrator`] wires the above into the running dev loop

pub mod broadcaster;
pub mod builder;
pub mod config;
pub mod controller;
pub mod markup;
pub mod orchestrator;
pub mod server;
pub mod state;
pub mod watcher;

// Re-exports
pub use broadcaster::{ClientGuard, ReloadBroadcaster, TransportError};
pub use builder::{create_compiler, BuildSettings, CycleFailure, CycleReport, DevBuilder};
pub use config::DevConfig;
pub use controller::{CycleKind, Debouncer, Trigger, WatchController, WatchEvent, WatchEventKind};
pub use markup::{transform_document, TransformError, LIVE_RELOAD_MARKER, RELOAD_ENDPOINT};
pub use orchestrator::{DevLoop, LoopStats};
pub use server::{resolve, router, AssetResponse, DevServer, STATUS_ENDPOINT};
pub use state::{BuildStatus, DevServerState, SharedState, StatusReport};
pub use watcher::FileWatcher;
