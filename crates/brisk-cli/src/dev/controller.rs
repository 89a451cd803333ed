//! Watch controller.
//!
//! Two pure pieces the dev loop drives:
//!
//! - [`Debouncer`] collapses a burst of [`WatchEvent`]s into one [`Trigger`]
//!   once the source tree has been quiet for the debounce window.
//! - [`WatchController`] is the `Idle` / `Building` / `PendingRebuild` state
//!   machine that keeps at most one build cycle in flight and coalesces
//!   triggers that arrive during a build into a single follow-up cycle.
//!
//! Neither touches the clock or the filesystem; callers pass `now` in.

use brisk_bundler::{MARKUP_EXTENSIONS, SCRIPT_EXTENSIONS, STYLE_EXTENSIONS};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// A burst is flushed after at most this many debounce windows even if
/// events keep arriving.
const MAX_DELAY_WINDOWS: u32 = 10;

/// Filesystem change type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
}

/// A filesystem notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, WatchEventKind::Modified)
    }
}

/// What a changed path means for the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    /// Script or stylesheet: rediscover, recompile, re-derive markup
    Source,
    /// Markup document: re-derive markup only
    Markup,
    Ignored,
}

/// Classify a path by its extension.
pub fn classify(path: &Path) -> Relevance {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Relevance::Ignored;
    };

    if SCRIPT_EXTENSIONS.contains(&ext) || STYLE_EXTENSIONS.contains(&ext) {
        Relevance::Source
    } else if MARKUP_EXTENSIONS.contains(&ext) {
        Relevance::Markup
    } else {
        Relevance::Ignored
    }
}

/// Work a build cycle has to do. `Full` covers everything `MarkupOnly` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CycleKind {
    /// Re-derive markup against the last known artifacts
    MarkupOnly,
    /// Discover, compile, re-derive markup
    Full,
}

impl CycleKind {
    fn for_relevance(relevance: Relevance) -> Option<Self> {
        match relevance {
            Relevance::Source => Some(CycleKind::Full),
            Relevance::Markup => Some(CycleKind::MarkupOnly),
            Relevance::Ignored => None,
        }
    }
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleKind::MarkupOnly => f.write_str("markup"),
            CycleKind::Full => f.write_str("full"),
        }
    }
}

/// A debounced request for a build cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub kind: CycleKind,
    /// Paths that contributed, sorted
    pub paths: Vec<PathBuf>,
}

/// Trailing-edge debouncer.
///
/// A trigger becomes ready once no relevant event arrived for `window`, or
/// once the burst has lasted `MAX_DELAY_WINDOWS * window`.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    max_delay: Duration,
    changes: BTreeMap<PathBuf, (WatchEventKind, CycleKind)>,
    first_event: Option<Instant>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            max_delay: window * MAX_DELAY_WINDOWS,
            changes: BTreeMap::new(),
            first_event: None,
            last_event: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an event. Returns `false` when the path is irrelevant.
    pub fn push(&mut self, event: WatchEvent, now: Instant) -> bool {
        let Some(cycle) = CycleKind::for_relevance(classify(&event.path)) else {
            return false;
        };

        match self.changes.get(&event.path).map(|(kind, _)| *kind) {
            // Appeared and vanished within one burst: nothing changed
            Some(WatchEventKind::Created) if event.kind == WatchEventKind::Removed => {
                self.changes.remove(&event.path);
            }
            // Deleted then restored counts as a creation
            Some(WatchEventKind::Removed) if event.kind != WatchEventKind::Removed => {
                self.changes
                    .insert(event.path, (WatchEventKind::Created, cycle));
            }
            Some(WatchEventKind::Created) => {}
            _ => {
                self.changes.insert(event.path, (event.kind, cycle));
            }
        }

        self.first_event.get_or_insert(now);
        self.last_event = Some(now);
        true
    }

    /// Whether events are waiting to be flushed.
    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// When the pending burst becomes ready, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        let last = self.last_event?;
        let first = self.first_event.unwrap_or(last);
        Some((last + self.window).min(first + self.max_delay))
    }

    /// Flush the burst if its deadline has passed.
    ///
    /// Returns `None` when nothing is ready, or when the burst cancelled out.
    pub fn take_ready(&mut self, now: Instant) -> Option<Trigger> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }

        self.first_event = None;
        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);

        let kind = changes.values().map(|(_, cycle)| *cycle).max()?;
        Some(Trigger {
            kind,
            paths: changes.into_keys().collect(),
        })
    }
}

/// Build-cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Building(CycleKind),
    /// A trigger arrived mid-build; `pending` runs when `current` completes
    PendingRebuild {
        current: CycleKind,
        pending: CycleKind,
    },
}

/// At-most-one-in-flight scheduler.
///
/// A cycle is never cancelled. Triggers that arrive while one is in flight
/// merge into a single pending cycle of the widest kind requested.
#[derive(Debug)]
pub struct WatchController {
    state: ControllerState,
}

impl Default for WatchController {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Idle,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ControllerState::Idle
    }

    /// Handle a debounced trigger. Returns the cycle to start now, if any.
    pub fn on_trigger(&mut self, kind: CycleKind) -> Option<CycleKind> {
        match self.state {
            ControllerState::Idle => {
                self.state = ControllerState::Building(kind);
                Some(kind)
            }
            ControllerState::Building(current) => {
                self.state = ControllerState::PendingRebuild {
                    current,
                    pending: kind,
                };
                None
            }
            ControllerState::PendingRebuild { current, pending } => {
                self.state = ControllerState::PendingRebuild {
                    current,
                    pending: pending.max(kind),
                };
                None
            }
        }
    }

    /// Handle completion of the in-flight cycle. Returns the follow-up cycle
    /// to start immediately, if one was pending.
    pub fn on_cycle_complete(&mut self) -> Option<CycleKind> {
        match self.state {
            ControllerState::Idle => {
                tracing::debug!("Cycle completion reported while idle");
                None
            }
            ControllerState::Building(_) => {
                self.state = ControllerState::Idle;
                None
            }
            ControllerState::PendingRebuild { pending, .. } => {
                self.state = ControllerState::Building(pending);
                Some(pending)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Path::new("src/index.ts")), Relevance::Source);
        assert_eq!(classify(Path::new("src/app.tsx")), Relevance::Source);
        assert_eq!(classify(Path::new("src/theme.scss")), Relevance::Source);
        assert_eq!(classify(Path::new("src/index.html")), Relevance::Markup);
        assert_eq!(classify(Path::new("src/logo.png")), Relevance::Ignored);
        assert_eq!(classify(Path::new("src/Makefile")), Relevance::Ignored);
    }

    #[test]
    fn test_burst_on_one_path_yields_one_trigger() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        for i in 0..20 {
            assert!(debouncer.push(WatchEvent::modified("src/index.ts"), start + ms(i * 4)));
        }

        let last = start + ms(76);
        assert_eq!(debouncer.take_ready(last + ms(99)), None);

        let trigger = debouncer.take_ready(last + WINDOW).unwrap();
        assert_eq!(trigger.kind, CycleKind::Full);
        assert_eq!(trigger.paths, vec![PathBuf::from("src/index.ts")]);

        assert_eq!(debouncer.take_ready(last + ms(500)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_burst_across_paths_merges() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        debouncer.push(WatchEvent::modified("src/a.ts"), start);
        debouncer.push(WatchEvent::modified("src/b.ts"), start + ms(30));
        debouncer.push(WatchEvent::modified("src/index.html"), start + ms(60));

        let trigger = debouncer.take_ready(start + ms(160)).unwrap();
        assert_eq!(trigger.kind, CycleKind::Full);
        assert_eq!(trigger.paths.len(), 3);
    }

    #[test]
    fn test_markup_only_burst() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push(WatchEvent::modified("src/index.html"), start);

        let trigger = debouncer.take_ready(start + WINDOW).unwrap();
        assert_eq!(trigger.kind, CycleKind::MarkupOnly);
    }

    #[test]
    fn test_ignored_events_do_not_arm() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        assert!(!debouncer.push(WatchEvent::modified("src/notes.txt"), start));
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn test_created_then_removed_cancels_out() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push(WatchEvent::new("src/tmp.ts", WatchEventKind::Created), start);
        debouncer.push(WatchEvent::new("src/tmp.ts", WatchEventKind::Removed), start + ms(5));

        assert_eq!(debouncer.take_ready(start + ms(200)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_continuous_stream_is_capped() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);

        let mut fired = 0;
        for i in 0..60u64 {
            let now = start + ms(i * 50);
            if debouncer.take_ready(now).is_some() {
                fired += 1;
            }
            debouncer.push(WatchEvent::modified("src/index.ts"), now);
        }
        // 3s of events every 50ms; a flush at least every second
        assert!(fired >= 2, "fired {}", fired);
    }

    #[test]
    fn test_deadline_tracks_last_event() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.push(WatchEvent::modified("src/a.ts"), start);
        debouncer.push(WatchEvent::modified("src/a.ts"), start + ms(40));
        assert_eq!(debouncer.deadline(), Some(start + ms(140)));
    }

    #[test]
    fn test_controller_idle_to_building_to_idle() {
        let mut controller = WatchController::new();
        assert_eq!(controller.on_trigger(CycleKind::Full), Some(CycleKind::Full));
        assert_eq!(controller.state(), ControllerState::Building(CycleKind::Full));
        assert_eq!(controller.on_cycle_complete(), None);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_controller_coalesces_triggers_during_build() {
        let mut controller = WatchController::new();
        controller.on_trigger(CycleKind::MarkupOnly);

        for _ in 0..10 {
            assert_eq!(controller.on_trigger(CycleKind::MarkupOnly), None);
        }
        assert_eq!(controller.on_trigger(CycleKind::Full), None);
        assert_eq!(controller.on_trigger(CycleKind::MarkupOnly), None);

        assert_eq!(
            controller.state(),
            ControllerState::PendingRebuild {
                current: CycleKind::MarkupOnly,
                pending: CycleKind::Full
            }
        );

        // One follow-up cycle of the widest kind, then idle
        assert_eq!(controller.on_cycle_complete(), Some(CycleKind::Full));
        assert_eq!(controller.on_cycle_complete(), None);
        assert!(controller.is_idle());
    }
}
