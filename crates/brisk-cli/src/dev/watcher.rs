//! File system watcher for the source root.
//!
//! Forwards notify events as [`WatchEvent`]s over a channel. Filtering here
//! is path-based only (hidden files, editor temp files, ignored directories);
//! relevance by extension and debouncing happen in the controller.

use crate::dev::controller::{WatchEvent, WatchEventKind};
use crate::error::{CliError, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Channel capacity between the notify thread and the dev loop.
const EVENT_BUFFER: usize = 256;

/// Recursive watcher over the source root.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").field("root", &self.root).finish()
    }
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// Paths under any of `ignore_dirs` never produce events.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` doesn't exist or the watcher cannot be
    /// created.
    pub fn new(root: PathBuf, ignore_dirs: Vec<PathBuf>) -> Result<(Self, mpsc::Receiver<WatchEvent>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watcher error: {}", e);
                    return;
                }
            };

            let Some(kind) = event_kind(&event.kind) else {
                return;
            };

            for path in event.paths {
                if should_ignore(&path, &watch_root, &ignore_dirs) {
                    continue;
                }
                // The receiver is gone once the dev loop shuts down
                if tx.blocking_send(WatchEvent::new(path, kind)).is_err() {
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!("Watching {}", root.display());

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Map a notify event kind; `None` for access and metadata-only changes.
fn event_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Created),
        EventKind::Remove(_) => Some(WatchEventKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(WatchEventKind::Modified),
        _ => None,
    }
}

/// Check if a path should never reach the controller.
///
/// Ignores paths outside `root`, anything under `ignore_dirs`, hidden
/// components, and editor swap/backup files.
pub fn should_ignore(path: &Path, root: &Path, ignore_dirs: &[PathBuf]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };

    if ignore_dirs.iter().any(|dir| path.starts_with(dir)) {
        return true;
    }

    for component in rel_path.components() {
        if let Some(name) = component.as_os_str().to_str() {
            if name.starts_with('.') && name != "." && name != ".." {
                return true;
            }
        }
    }

    is_editor_temp_file(path)
}

fn is_editor_temp_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".swx")
        || name.ends_with(".tmp")
        || name.starts_with("#")
}
