//! # brisk-store
//!
//! Holds the latest built artifacts per logical name.
//!
//! Two backends satisfy the same [`ArtifactStore`] contract:
//!
//! - [`MemoryStore`]: artifacts live only in process state.
//! - [`DiskStore`]: artifacts live under a destination root, one file per key.
//!
//! The asset server only ever calls [`ArtifactStore::get`] and never needs to
//! know which backend is active.
//!
//! ## Commits
//!
//! A build cycle never writes artifacts one by one. It stages its whole output
//! in a [`CommitBatch`] and hands it to [`ArtifactStore::commit`], which
//! replaces every key in the batch and prunes keys of the batch's kinds that
//! the cycle no longer produced. Readers observe either the previous cycle or
//! the new one.

mod disk;
mod error;
mod key;
mod manifest;
mod memory;

pub use disk::DiskStore;
pub use error::{StoreError, StoreResult};
pub use key::{validate_name, ArtifactKey};
pub use memory::MemoryStore;

use async_trait::async_trait;
use brisk_bundler::{Artifact, ArtifactKind};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Where an artifact's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Path under the destination root
    Disk(PathBuf),
    /// Key in process memory
    Memory(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Disk(path) => write!(f, "{}", path.display()),
            Location::Memory(key) => write!(f, "memory:{}", key),
        }
    }
}

/// Output of one build cycle, staged for an atomic commit.
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    pub artifacts: Vec<Artifact>,
    /// Kinds this batch is authoritative for. Stored keys of these kinds that
    /// are absent from `artifacts` are removed by the commit.
    pub scope: BTreeSet<ArtifactKind>,
}

impl CommitBatch {
    pub fn new(artifacts: Vec<Artifact>, scope: impl IntoIterator<Item = ArtifactKind>) -> Self {
        Self {
            artifacts,
            scope: scope.into_iter().collect(),
        }
    }

    /// Batch owning every kind (compiled output and markup).
    pub fn full(artifacts: Vec<Artifact>) -> Self {
        Self::new(artifacts, ArtifactKind::ALL)
    }

    /// Batch owning only markup documents.
    pub fn markup(artifacts: Vec<Artifact>) -> Self {
        Self::new(artifacts, [ArtifactKind::Markup])
    }

    pub fn keys(&self) -> BTreeSet<ArtifactKey> {
        self.artifacts
            .iter()
            .map(|a| ArtifactKey::new(a.name.clone(), a.kind))
            .collect()
    }

    /// Validate every name before anything is written.
    pub fn validate(&self) -> StoreResult<()> {
        self.artifacts
            .iter()
            .try_for_each(|a| validate_name(&a.name))
    }

    /// Stored keys that a commit of this batch would remove.
    pub(crate) fn stale<'a>(
        &self,
        stored: impl IntoIterator<Item = &'a ArtifactKey>,
    ) -> Vec<ArtifactKey> {
        let fresh = self.keys();
        stored
            .into_iter()
            .filter(|key| self.scope.contains(&key.kind) && !fresh.contains(*key))
            .cloned()
            .collect()
    }
}

/// Counts reported by a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub written: usize,
    pub removed: usize,
}

/// Key-value store for built artifacts.
///
/// `put` fully replaces any previous value for its key; nothing is ever
/// appended or merged.
#[async_trait]
pub trait ArtifactStore: Send + Sync + fmt::Debug {
    /// Backend name used in log output
    fn backend(&self) -> &'static str;

    /// Where the artifact for `key` lives (or would live).
    fn locate(&self, key: &ArtifactKey) -> Location;

    /// Store one artifact, replacing any previous value.
    async fn put(&self, artifact: Artifact) -> StoreResult<()>;

    /// Read the current bytes for `(name, kind)`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if nothing is stored under the key.
    async fn get(&self, name: &str, kind: ArtifactKind) -> StoreResult<Vec<u8>>;

    /// Remove an artifact. Returns whether it existed.
    async fn remove(&self, key: &ArtifactKey) -> StoreResult<bool>;

    /// Every stored key.
    async fn keys(&self) -> StoreResult<BTreeSet<ArtifactKey>>;

    /// Replace the store's contents for the batch scope in one step.
    async fn commit(&self, batch: CommitBatch) -> StoreResult<CommitSummary>;
}
