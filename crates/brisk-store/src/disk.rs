//! Disk-backed artifact store.
//!
//! Each key maps to `<root>/<name>.<ext>`. Writes go to a dot-prefixed temp
//! file in the same directory and are renamed into place, so a reader never
//! sees a half-written file.
//!
//! A commit stages every artifact before touching a live file, then swaps
//! them in. If a swap fails, the files already replaced are restored from
//! their backups. Pruning and `keys()` only consider files recorded in the
//! store's [manifest](crate::manifest), so files brisk did not write are
//! never removed.

use crate::manifest::Manifest;
use crate::{
    validate_name, ArtifactKey, ArtifactStore, CommitBatch, CommitSummary, Location, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use brisk_bundler::{Artifact, ArtifactKind};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Artifacts stored as files under a destination root.
#[derive(Debug)]
pub struct DiskStore {
    root: PathBuf,
    /// Readers share, commits are exclusive.
    gate: RwLock<()>,
    temp_counter: AtomicU64,
}

/// An artifact written to its temp file, not yet visible.
struct Staged {
    key: ArtifactKey,
    temp: PathBuf,
    target: PathBuf,
}

/// A staged file swapped into place, with the previous file if there was one.
struct Installed {
    target: PathBuf,
    backup: Option<PathBuf>,
}

impl DiskStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gate: RwLock::new(()),
            temp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        key.file_name()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Sibling of `target` named `.<file>.<pid>-<n>.<suffix>`.
    fn sibling(&self, target: &Path, suffix: &str) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = target
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        let dir = target.parent().unwrap_or(&self.root);
        dir.join(format!(".{}.{}-{}.{}", file_name, std::process::id(), n, suffix))
    }

    async fn stage(&self, artifact: &Artifact) -> StoreResult<Staged> {
        validate_name(&artifact.name)?;
        let key = ArtifactKey::new(artifact.name.clone(), artifact.kind);
        let target = self.path_for(&key);
        let dir = target.parent().unwrap_or(&self.root).to_path_buf();

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let temp = self.sibling(&target, "tmp");
        if let Err(e) = tokio::fs::write(&temp, &artifact.bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::io(&temp, e));
        }
        Ok(Staged { key, temp, target })
    }

    /// Stage every artifact. On failure no temp file is left behind.
    async fn stage_all(&self, artifacts: &[Artifact]) -> StoreResult<Vec<Staged>> {
        let mut staged = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match self.stage(artifact).await {
                Ok(file) => staged.push(file),
                Err(e) => {
                    discard(&staged).await;
                    return Err(e);
                }
            }
        }
        Ok(staged)
    }

    /// Swap staged files into place, all or nothing.
    async fn install_all(&self, staged: &[Staged]) -> StoreResult<()> {
        let mut installed: Vec<Installed> = Vec::with_capacity(staged.len());

        for (i, file) in staged.iter().enumerate() {
            match self.install(file).await {
                Ok(done) => installed.push(done),
                Err(e) => {
                    rollback(&installed).await;
                    discard(&staged[i..]).await;
                    return Err(e);
                }
            }
        }

        for done in &installed {
            if let Some(backup) = &done.backup {
                let _ = tokio::fs::remove_file(backup).await;
            }
        }
        Ok(())
    }

    async fn install(&self, file: &Staged) -> StoreResult<Installed> {
        let backup = match tokio::fs::symlink_metadata(&file.target).await {
            Ok(meta) if meta.is_dir() => {
                return Err(StoreError::Io {
                    path: file.target.clone(),
                    message: "a directory is in the way".to_string(),
                });
            }
            Ok(_) => {
                let backup = self.sibling(&file.target, "bak");
                tokio::fs::rename(&file.target, &backup)
                    .await
                    .map_err(|e| StoreError::io(&file.target, e))?;
                Some(backup)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::io(&file.target, e)),
        };

        if let Err(e) = tokio::fs::rename(&file.temp, &file.target).await {
            if let Some(backup) = &backup {
                let _ = tokio::fs::rename(backup, &file.target).await;
            }
            return Err(StoreError::io(&file.target, e));
        }

        Ok(Installed {
            target: file.target.clone(),
            backup,
        })
    }

    async fn remove_file(&self, key: &ArtifactKey) -> StoreResult<bool> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

async fn discard(staged: &[Staged]) {
    for file in staged {
        let _ = tokio::fs::remove_file(&file.temp).await;
    }
}

async fn rollback(installed: &[Installed]) {
    for done in installed.iter().rev() {
        let restored = match &done.backup {
            Some(backup) => tokio::fs::rename(backup, &done.target).await,
            None => tokio::fs::remove_file(&done.target).await,
        };
        if let Err(e) = restored {
            tracing::warn!("Failed to restore {}: {}", done.target.display(), e);
        }
    }
}

#[async_trait]
impl ArtifactStore for DiskStore {
    fn backend(&self) -> &'static str {
        "disk"
    }

    fn locate(&self, key: &ArtifactKey) -> Location {
        Location::Disk(self.path_for(key))
    }

    async fn put(&self, artifact: Artifact) -> StoreResult<()> {
        let _gate = self.gate.write().await;
        let staged = self.stage_all(std::slice::from_ref(&artifact)).await?;
        self.install_all(&staged).await?;

        let mut manifest = Manifest::load(&self.root).await?;
        for file in &staged {
            manifest.insert(&file.key);
        }
        manifest.save(&self.root).await
    }

    async fn get(&self, name: &str, kind: ArtifactKind) -> StoreResult<Vec<u8>> {
        let key = ArtifactKey::new(name, kind);
        if validate_name(name).is_err() {
            return Err(StoreError::NotFound(key));
        }

        let _gate = self.gate.read().await;
        let path = self.path_for(&key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key)),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn remove(&self, key: &ArtifactKey) -> StoreResult<bool> {
        let _gate = self.gate.write().await;
        let mut manifest = Manifest::load(&self.root).await?;
        if !manifest.keys().any(|k| &k == key) {
            return Ok(false);
        }

        let removed = self.remove_file(key).await?;
        manifest.remove(key);
        manifest.save(&self.root).await?;
        Ok(removed)
    }

    async fn keys(&self) -> StoreResult<BTreeSet<ArtifactKey>> {
        let _gate = self.gate.read().await;
        let manifest = Manifest::load(&self.root).await?;

        let mut keys = BTreeSet::new();
        for key in manifest.keys() {
            let path = self.path_for(&key);
            if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                keys.insert(key);
            }
        }
        Ok(keys)
    }

    async fn commit(&self, batch: CommitBatch) -> StoreResult<CommitSummary> {
        batch.validate()?;

        let _gate = self.gate.write().await;
        let mut manifest = Manifest::load(&self.root).await?;

        let staged = self.stage_all(&batch.artifacts).await?;
        self.install_all(&staged).await?;
        for file in &staged {
            manifest.insert(&file.key);
        }

        let owned: Vec<ArtifactKey> = manifest.keys().collect();
        let mut removed = 0;
        for key in batch.stale(owned.iter()) {
            if self.remove_file(&key).await? {
                tracing::debug!("Pruned stale artifact {}", key);
                removed += 1;
            }
            manifest.remove(&key);
        }
        manifest.save(&self.root).await?;

        Ok(CommitSummary {
            written: batch.artifacts.len(),
            removed,
        })
    }
}
