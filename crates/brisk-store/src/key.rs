//! Artifact keys and name validation.

use crate::error::{StoreError, StoreResult};
use brisk_bundler::ArtifactKind;
use std::fmt;

/// Identity of a stored artifact: logical name plus kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub name: String,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(name: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Relative file name, e.g. `pages/about.js`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.extension())
    }

    /// Parse a `/`-separated relative file name back into a key.
    ///
    /// Returns `None` for unknown extensions.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        ArtifactKind::split_file_name(file_name).map(|(name, kind)| Self::new(name, kind))
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Check that a logical name is a safe relative path.
///
/// Names are `/`-separated; segments may not be empty, `.`, `..` or start
/// with a dot (dot-files are reserved for staging).
pub fn validate_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('\\') || name.contains('\0') {
        return Err(invalid("name contains a backslash or NUL byte"));
    }
    if name.starts_with('/') {
        return Err(invalid("name must be relative"));
    }
    for segment in name.split('/') {
        if segment.is_empty() {
            return Err(invalid("name contains an empty segment"));
        }
        if segment.starts_with('.') {
            return Err(invalid("segments may not start with '.'"));
        }
    }
    Ok(())
}
