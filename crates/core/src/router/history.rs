use super::response::ViewHandle;
use scanline_signals::StatelessSignal;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

/// Source of the maximum number of back entries.
///
/// Read on every push, so implementations may change their answer at runtime.
pub trait HistoryLimit: Send + Sync {
    fn max_history_size(&self) -> usize;
}

impl HistoryLimit for usize {
    fn max_history_size(&self) -> usize {
        *self
    }
}

/// A visited page. View and toolbar are dropped once the entry is evicted,
/// expired or invalidated; path and title always survive.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub path: String,
    pub page_title: String,
    pub view: Option<ViewHandle>,
    pub toolbar: Option<ViewHandle>,
    pub expires_at: Option<Instant>,
}

impl HistoryEntry {
    pub fn new(path: impl Into<String>, page_title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            page_title: page_title.into(),
            view: None,
            toolbar: None,
            expires_at: None,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn release(&mut self) {
        self.view = None;
        self.toolbar = None;
    }
}

#[derive(Default)]
struct HistoryState {
    current: Option<HistoryEntry>,
    entries: VecDeque<HistoryEntry>,
}

/// Bounded back stack plus the page currently shown.
///
/// Mutations take the write lock only for the change itself; the `updated`
/// signal fires after the lock is released, so subscribers may query or even
/// mutate the history again.
pub struct History {
    state: RwLock<HistoryState>,
    limit: Arc<dyn HistoryLimit>,
}

impl History {
    pub fn new(limit: Arc<dyn HistoryLimit>) -> Self {
        Self {
            state: RwLock::new(HistoryState::default()),
            limit,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HistoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HistoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_currently_on(&self, path: &str) -> bool {
        self.read()
            .current
            .as_ref()
            .is_some_and(|current| current.path == path)
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        self.read().current.clone()
    }

    pub fn entries_count(&self) -> usize {
        self.read().entries.len()
    }

    /// Back entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.read().entries.iter().cloned().collect()
    }

    pub fn max_size(&self) -> usize {
        self.limit.max_history_size()
    }

    /// Makes `entry` current, moving the previous current onto the back stack.
    ///
    /// The oldest entries are evicted first so the stack never grows past the
    /// configured maximum. With a maximum of zero nothing is kept.
    pub fn push(self: &Arc<Self>, entry: HistoryEntry, updated: &StatelessSignal<Arc<History>>) {
        {
            let max = self.max_size();
            let mut state = self.write();
            if let Some(mut previous) = state.current.take() {
                while !state.entries.is_empty() && state.entries.len() >= max {
                    if let Some(mut evicted) = state.entries.pop_front() {
                        evicted.release();
                    }
                }
                if max > 0 {
                    state.entries.push_back(previous);
                } else {
                    previous.release();
                }
            }
            state.current = Some(entry);
        }
        updated.notify(Arc::clone(self));
    }

    /// Steps back: the newest back entry becomes current and is returned.
    ///
    /// An expired entry comes back without view and toolbar, so the caller
    /// knows it has to regenerate the page.
    pub fn pop(self: &Arc<Self>, updated: &StatelessSignal<Arc<History>>) -> Option<HistoryEntry> {
        let popped = {
            let mut state = self.write();
            let mut entry = state.entries.pop_back()?;
            if entry.is_expired_at(Instant::now()) {
                entry.release();
            }
            state.current = Some(entry.clone());
            entry
        };
        updated.notify(Arc::clone(self));
        Some(popped)
    }

    /// Marks the current page stale without removing it. Returns its path.
    pub fn invalidate_current(&self) -> Option<String> {
        let mut state = self.write();
        let current = state.current.as_mut()?;
        current.release();
        Some(current.path.clone())
    }

    /// Drops every entry including the current one.
    pub fn clear(self: &Arc<Self>, updated: &StatelessSignal<Arc<History>>) {
        {
            let mut state = self.write();
            for entry in state.entries.iter_mut() {
                entry.release();
            }
            if let Some(current) = state.current.as_mut() {
                current.release();
            }
            state.current = None;
            state.entries.clear();
        }
        updated.notify(Arc::clone(self));
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("History")
            .field("current", &state.current.as_ref().map(|e| &e.path))
            .field("entries", &state.entries.iter().map(|e| &e.path).collect::<Vec<_>>())
            .field("max_size", &self.max_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn history(max: usize) -> Arc<History> {
        Arc::new(History::new(Arc::new(max)))
    }

    fn entry(path: &str) -> HistoryEntry {
        let mut entry = HistoryEntry::new(path, path.to_uppercase());
        entry.view = Some(ViewHandle::new(path.to_string()));
        entry
    }

    fn paths(history: &History) -> Vec<String> {
        history.entries().into_iter().map(|e| e.path).collect()
    }

    #[test]
    fn test_push_evicts_oldest_first() {
        let updated = StatelessSignal::new();
        let history = history(2);
        for path in ["a", "b", "c", "d"] {
            history.push(entry(path), &updated);
        }

        assert_eq!(paths(&history), vec!["b", "c"]);
        assert_eq!(history.current().unwrap().path, "d");
    }

    #[test]
    fn test_zero_limit_keeps_only_current() {
        let updated = StatelessSignal::new();
        let history = history(0);
        history.push(entry("a"), &updated);
        history.push(entry("b"), &updated);

        assert_eq!(history.entries_count(), 0);
        assert!(history.is_currently_on("b"));
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let updated = StatelessSignal::new();
        let history = history(5);
        history.push(entry("a"), &updated);

        assert!(history.pop(&updated).is_none());
        assert!(history.is_currently_on("a"));
    }

    #[test]
    fn test_pop_releases_expired_views() {
        let updated = StatelessSignal::new();
        let history = history(5);
        let mut stale = entry("a");
        stale.expires_at = Some(Instant::now() - Duration::from_secs(1));
        history.push(stale, &updated);
        history.push(entry("b"), &updated);

        let popped = history.pop(&updated).unwrap();
        assert_eq!(popped.path, "a");
        assert_eq!(popped.page_title, "A");
        assert!(popped.view.is_none());
        assert!(history.current().unwrap().view.is_none());
    }

    #[test]
    fn test_pop_keeps_fresh_views() {
        let updated = StatelessSignal::new();
        let history = history(5);
        let mut fresh = entry("a");
        fresh.expires_at = Some(Instant::now() + Duration::from_secs(60));
        history.push(fresh, &updated);
        history.push(entry("b"), &updated);

        assert!(history.pop(&updated).unwrap().view.is_some());
    }

    #[test]
    fn test_invalidate_current() {
        let updated = StatelessSignal::new();
        let history = history(5);
        history.push(entry("x"), &updated);

        assert_eq!(history.invalidate_current().as_deref(), Some("x"));
        let current = history.current().unwrap();
        assert_eq!(current.path, "x");
        assert!(current.view.is_none());
        assert!(current.toolbar.is_none());
    }

    #[test]
    fn test_invalidate_without_current() {
        assert!(history(5).invalidate_current().is_none());
    }

    #[test]
    fn test_clear_empties_everything() {
        let updated = StatelessSignal::new();
        let history = history(5);
        history.push(entry("a"), &updated);
        history.push(entry("b"), &updated);
        history.clear(&updated);

        assert!(history.current().is_none());
        assert_eq!(history.entries_count(), 0);
    }

    #[test]
    fn test_notifications_fire_after_mutation() {
        let updated = StatelessSignal::<Arc<History>>::new();
        let observed = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        updated.on(move |history: &Arc<History>| {
            // Reading here would deadlock if the write lock were still held.
            sink.lock().unwrap().push(history.entries_count());
            scanline_signals::CONTINUE
        });

        let history = history(5);
        history.push(entry("a"), &updated);
        history.push(entry("b"), &updated);
        history.pop(&updated);
        history.clear(&updated);

        assert_eq!(*observed.lock().unwrap(), vec![0, 1, 0, 0]);
    }
}
