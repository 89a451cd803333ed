//! Record of the files a [`DiskStore`](crate::DiskStore) has written.
//!
//! The destination may hold files brisk never produced. Only keys listed
//! here are reported by `keys()` or pruned by a commit.

use crate::{ArtifactKey, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Dot-prefixed, so it can never collide with an artifact name.
pub(crate) const MANIFEST_FILE: &str = ".brisk-manifest.json";

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Manifest {
    /// Relative file names, e.g. `pages/about.js`
    files: BTreeSet<String>,
}

impl Manifest {
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Load the manifest under `root`. Missing means nothing was written yet;
    /// an unreadable one is treated the same so nothing gets pruned.
    pub async fn load(root: &Path) -> StoreResult<Self> {
        let path = Self::path(root);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        match serde_json::from_slice(&bytes) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                tracing::warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Write the manifest through a temp file and rename.
    pub async fn save(&self, root: &Path) -> StoreResult<()> {
        let path = Self::path(root);
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| StoreError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| StoreError::io(root, e))?;
        let temp = root.join(format!("{}.{}.tmp", MANIFEST_FILE, std::process::id()));
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| StoreError::io(&temp, e))?;
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::io(path, e));
        }
        Ok(())
    }

    pub fn insert(&mut self, key: &ArtifactKey) {
        self.files.insert(key.file_name());
    }

    pub fn remove(&mut self, key: &ArtifactKey) {
        self.files.remove(&key.file_name());
    }

    pub fn keys(&self) -> impl Iterator<Item = ArtifactKey> + '_ {
        self.files
            .iter()
            .filter_map(|file| ArtifactKey::from_file_name(file))
    }
}
