use crate::config::{BriskConfig, Destination};
use crate::error::ConfigError;
use std::path::{Component, Path, PathBuf};

impl BriskConfig {
    /// Reject settings the dev loop cannot run with.
    ///
    /// Paths are compared after resolving them against `cwd`.
    pub fn validate(&self, cwd: &Path) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::invalid_value(
                "debounceMs",
                0,
                "Use a debounce window of at least 1ms (default: 100)",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "port",
                0,
                "Use a port between 1 and 65535",
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "host",
                "\"\"",
                "Use an address such as 127.0.0.1 or 0.0.0.0",
            ));
        }

        if let Err(e) = brisk_store::validate_name(&self.root_document) {
            return Err(ConfigError::invalid_value(
                "rootDocument",
                format!("{:?}", self.root_document),
                format!(
                    "{}. Use the logical name of a markup document, e.g. \"index\"",
                    e
                ),
            ));
        }

        if let Destination::Disk(dest) = &self.destination {
            let source_root = resolve_path(cwd, &self.source_root);
            let dest = resolve_path(cwd, dest);
            if dest.starts_with(&source_root) {
                return Err(ConfigError::ConflictingOptions(format!(
                    "destination {} is inside source root {}; compiled output would retrigger the watcher",
                    dest.display(),
                    source_root.display()
                )));
            }
            if source_root.starts_with(&dest) {
                return Err(ConfigError::ConflictingOptions(format!(
                    "destination {} contains source root {}; pruning could delete sources and the watcher would ignore them",
                    dest.display(),
                    source_root.display()
                )));
            }
        }

        Ok(())
    }
}

/// Join `path` onto `cwd` and remove `.` and `..` components lexically.
pub fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    let joined = cwd.join(path);
    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}
