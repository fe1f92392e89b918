use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, PendingChange};
use crate::debug;
use crate::utils::path::{is_temp_file, normalize_path};

/// FIFO change queue drained one entry per tick.
///
/// No business logic: it only orders, merges and suppresses raw events.
pub(super) struct Debouncer {
    pub(super) queue: VecDeque<PendingChange>,
    /// Path → when it was last handed out
    pub(super) dispatched: FxHashMap<PathBuf, Instant>,
    same_file_window: Duration,
    /// Events under these roots are never queued (build output)
    ignored: Vec<PathBuf>,
}

impl Debouncer {
    pub(super) fn new(same_file_window: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            dispatched: FxHashMap::default(),
            same_file_window,
            ignored: Vec::new(),
        }
    }

    pub(super) fn with_ignored(mut self, roots: Vec<PathBuf>) -> Self {
        self.ignored = roots.iter().map(|p| normalize_path(p)).collect();
        self
    }

    /// Queue a notify event, applying merge rules against queued entries:
    /// - Removed → Created/Modified: restored, use the new kind
    /// - Modified → Removed: deleted, upgrade to Removed
    /// - Created → Removed: appeared then vanished, drop the entry
    /// - otherwise: first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);
            if self.ignored.iter().any(|root| path.starts_with(root)) {
                continue;
            }
            self.push(path, kind);
        }
    }

    fn push(&mut self, path: PathBuf, kind: ChangeKind) {
        let Some(pos) = self.queue.iter().position(|c| c.path == path) else {
            debug!("watch"; "event {}: {}", kind, path.display());
            self.queue.push_back(PendingChange { path, kind });
            return;
        };

        match (self.queue[pos].kind, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                debug!("watch"; "restore removed->{}: {}", kind, path.display());
                self.queue[pos].kind = kind;
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                debug!("watch"; "upgrade modified->removed: {}", path.display());
                self.queue[pos].kind = ChangeKind::Removed;
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                debug!("watch"; "discard created+removed: {}", path.display());
                self.queue.remove(pos);
            }
            _ => {}
        }
    }

    /// Take the oldest queued change for this tick.
    ///
    /// A path handed out less than `same_file_window` ago is consumed
    /// without being returned.
    pub(super) fn next_ready(&mut self, now: Instant) -> Option<PendingChange> {
        let window = self.same_file_window;
        self.dispatched
            .retain(|_, at| now.saturating_duration_since(*at) < window);

        let change = self.queue.pop_front()?;
        if self.dispatched.contains_key(&change.path) {
            debug!("watch"; "suppressed repeat: {}", change.path.display());
            return None;
        }

        self.dispatched.insert(change.path.clone(), now);
        Some(change)
    }

    pub(super) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
