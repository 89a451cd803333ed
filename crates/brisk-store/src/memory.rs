//! In-process artifact store.

use crate::{
    validate_name, ArtifactKey, ArtifactStore, CommitBatch, CommitSummary, Location, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use brisk_bundler::{Artifact, ArtifactKind};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Artifacts held in a map behind a read-write lock.
///
/// A commit applies under a single write lock, so readers never see a mix of
/// two cycles.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: RwLock<BTreeMap<ArtifactKey, Arc<[u8]>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn locate(&self, key: &ArtifactKey) -> Location {
        Location::Memory(key.file_name())
    }

    async fn put(&self, artifact: Artifact) -> StoreResult<()> {
        validate_name(&artifact.name)?;
        let key = ArtifactKey::new(artifact.name, artifact.kind);
        self.artifacts.write().insert(key, artifact.bytes.into());
        Ok(())
    }

    async fn get(&self, name: &str, kind: ArtifactKind) -> StoreResult<Vec<u8>> {
        let key = ArtifactKey::new(name, kind);
        self.artifacts
            .read()
            .get(&key)
            .map(|bytes| bytes.to_vec())
            .ok_or(StoreError::NotFound(key))
    }

    async fn remove(&self, key: &ArtifactKey) -> StoreResult<bool> {
        Ok(self.artifacts.write().remove(key).is_some())
    }

    async fn keys(&self) -> StoreResult<BTreeSet<ArtifactKey>> {
        Ok(self.artifacts.read().keys().cloned().collect())
    }

    async fn commit(&self, batch: CommitBatch) -> StoreResult<CommitSummary> {
        batch.validate()?;

        let mut artifacts = self.artifacts.write();
        let stale = batch.stale(artifacts.keys());
        for key in &stale {
            artifacts.remove(key);
        }

        let written = batch.artifacts.len();
        for artifact in batch.artifacts {
            artifacts.insert(
                ArtifactKey::new(artifact.name, artifact.kind),
                artifact.bytes.into(),
            );
        }

        Ok(CommitSummary {
            written,
            removed: stale.len(),
        })
    }
}
