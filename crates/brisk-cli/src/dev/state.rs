//! Shared state for the development server.
//!
//! Holds the artifact store handle, the reload broadcaster and the build
//! status. Only the dev loop's commit step writes to the store; the server
//! only reads.

use crate::dev::broadcaster::ReloadBroadcaster;
use brisk_store::ArtifactStore;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Build status tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// No build has been performed yet
    NotStarted,
    /// Build is currently in progress
    InProgress { started_at: Instant },
    /// Last build was committed
    Success { duration_ms: u64 },
    /// Last build failed; the previous artifacts are still served
    Failed { error: String },
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success { .. })
    }

    pub fn is_not_started(&self) -> bool {
        matches!(self, BuildStatus::NotStarted)
    }

    /// Get error message if failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            BuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// JSON body of the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// `not-started`, `in-progress`, `success` or `failed`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_cycles: u64,
    pub clients: usize,
    pub backend: &'static str,
}

/// Shared development server state.
#[derive(Debug)]
pub struct DevServerState {
    pub store: Arc<dyn ArtifactStore>,
    pub broadcaster: Arc<ReloadBroadcaster>,
    /// Logical name of the markup document served at `/`
    pub root_document: String,
    status: RwLock<BuildStatus>,
    completed_cycles: AtomicU64,
}

impl DevServerState {
    pub fn new(store: Arc<dyn ArtifactStore>, root_document: impl Into<String>) -> Self {
        Self {
            store,
            broadcaster: Arc::new(ReloadBroadcaster::new()),
            root_document: root_document.into(),
            status: RwLock::new(BuildStatus::NotStarted),
            completed_cycles: AtomicU64::new(0),
        }
    }

    pub fn start_build(&self) {
        *self.status.write() = BuildStatus::InProgress {
            started_at: Instant::now(),
        };
    }

    pub fn complete_build(&self, duration_ms: u64) {
        self.completed_cycles.fetch_add(1, Ordering::Relaxed);
        *self.status.write() = BuildStatus::Success { duration_ms };
    }

    pub fn fail_build(&self, error: String) {
        *self.status.write() = BuildStatus::Failed { error };
    }

    pub fn get_status(&self) -> BuildStatus {
        self.status.read().clone()
    }

    /// Cycles committed since startup.
    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles.load(Ordering::Relaxed)
    }

    pub fn status_report(&self) -> StatusReport {
        let (status, duration_ms, error) = match self.get_status() {
            BuildStatus::NotStarted => ("not-started", None, None),
            BuildStatus::InProgress { .. } => ("in-progress", None, None),
            BuildStatus::Success { duration_ms } => ("success", Some(duration_ms), None),
            BuildStatus::Failed { error } => ("failed", None, Some(error)),
        };

        StatusReport {
            status,
            duration_ms,
            error,
            completed_cycles: self.completed_cycles(),
            clients: self.broadcaster.client_count(),
            backend: self.store.backend(),
        }
    }
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<DevServerState>;
