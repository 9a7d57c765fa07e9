//! Client-side navigation: route table, bounded history and the router that
//! dispatches page handlers and reports progress through signals.
//!
//! ```text
//! navigate(path) ──► NavigationStarted(path)
//!        │
//!        ▼
//!   RouteTable::find_handler ──► blocking pool ──► Response
//!                                                    │
//!                 History::push ◄── HistoryEntry ◄───┘
//!                       │                │
//!                HistoryUpdated   NavigationCompleted(entry)
//! ```

mod handler;
mod history;
mod response;
mod route;
mod table;

pub use handler::{BoundHandler, RouteHandler, WithContext};
pub use history::{History, HistoryEntry, HistoryLimit};
pub use response::{
    INTERNAL_ERROR_TITLE, IntoResponse, NOT_FOUND_TITLE, Renderable, Response, StatusPage,
    ViewHandle,
};
pub use route::{PARAM_SIGIL, Route};
pub use table::RouteTable;

use crate::error::RegistrationError;
use scanline_signals::StatelessSignal;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

pub(crate) const LOG_TARGET: &str = "scanline::router";

/// Deep links may arrive with this prefix; routes are registered without it.
pub const SCHEME_PREFIX: &str = "plex://";

/// History and the three outgoing signals, shared with in-flight navigations.
struct Shared {
    history: Arc<History>,
    navigation_started: StatelessSignal<String>,
    navigation_completed: StatelessSignal<HistoryEntry>,
    history_updated: StatelessSignal<Arc<History>>,
}

impl Shared {
    fn complete(&self, path: String, response: Response, should_cache: bool, off_record: bool) {
        let mut entry = HistoryEntry {
            path,
            page_title: response.page_title,
            view: response.view.map(|view| view.render()),
            toolbar: response.toolbar.map(|toolbar| toolbar.render()),
            expires_at: response.expires_at,
        };
        if !should_cache {
            entry.expires_at = Some(Instant::now());
        }
        if !off_record {
            self.history.push(entry.clone(), &self.history_updated);
        }
        self.navigation_completed.notify(entry);
    }
}

struct DispatchContext<C> {
    app: Option<Arc<C>>,
    cancel: CancellationToken,
}

/// Navigation state machine.
///
/// Every navigation runs as an independent task; concurrent navigations to
/// different paths are not ordered against each other and the last one to
/// finish decides what is shown.
pub struct Router<C> {
    shared: Arc<Shared>,
    routes: RouteTable<C>,
    context: RwLock<DispatchContext<C>>,
    tracker: TaskTracker,
    runtime: Handle,
}

impl<C: Send + Sync + 'static> Router<C> {
    /// Creates a router spawning its navigations on `runtime`.
    pub fn new(runtime: Handle, limit: Arc<dyn HistoryLimit>) -> Self {
        Self {
            shared: Arc::new(Shared {
                history: Arc::new(History::new(limit)),
                navigation_started: StatelessSignal::new(),
                navigation_completed: StatelessSignal::new(),
                history_updated: StatelessSignal::new(),
            }),
            routes: RouteTable::new(),
            context: RwLock::new(DispatchContext {
                app: None,
                cancel: CancellationToken::new(),
            }),
            tracker: TaskTracker::new(),
            runtime,
        }
    }

    /// Injects the application context handed to handlers and the lifecycle
    /// token. Once the token is cancelled, finishing navigations are discarded.
    pub fn set_context(&self, app: Arc<C>, cancel: CancellationToken) {
        let mut context = self.context.write().unwrap_or_else(PoisonError::into_inner);
        context.app = Some(app);
        context.cancel = cancel;
    }

    pub fn routes(&self) -> &RouteTable<C> {
        &self.routes
    }

    /// Shorthand for `routes().register(..)`.
    pub fn route<H, Args>(
        &self,
        pattern: impl Into<String>,
        handler: H,
    ) -> Result<Route, RegistrationError>
    where
        H: RouteHandler<C, Args>,
        Args: 'static,
    {
        self.routes.register(pattern, handler)
    }

    pub fn history(&self) -> &Arc<History> {
        &self.shared.history
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        self.shared.history.current()
    }

    /// Fired synchronously when a navigation begins, with the normalized path.
    pub fn navigation_started(&self) -> &StatelessSignal<String> {
        &self.shared.navigation_started
    }

    /// Fired when a page is ready to be displayed.
    pub fn navigation_completed(&self) -> &StatelessSignal<HistoryEntry> {
        &self.shared.navigation_completed
    }

    pub fn history_updated(&self) -> &StatelessSignal<Arc<History>> {
        &self.shared.history_updated
    }

    /// Navigates to `path`. Does nothing when `path` is already current.
    pub fn navigate(&self, path: &str) {
        self.dispatch(normalize(path), false);
    }

    /// Forgets the whole history, then shows `path` without recording it, so
    /// there is nothing to go back to.
    pub fn navigate_clearing(&self, path: &str) {
        self.shared.history.clear(&self.shared.history_updated);
        self.dispatch(normalize(path), true);
    }

    /// Returns to the previous page, reusing its view when it has not expired.
    pub fn back(&self) {
        let history = &self.shared.history;
        if history.entries_count() == 0 {
            return;
        }
        let Some(previous) = history.pop(&self.shared.history_updated) else {
            return;
        };

        if previous.view.is_some() {
            debug!(target: LOG_TARGET, path = %previous.path, "restored page from history");
            self.shared.navigation_started.notify(previous.path.clone());
            self.shared.navigation_completed.notify(previous);
        } else {
            self.dispatch(previous.path, true);
        }
    }

    /// Regenerates the current page; the stale view stays visible until replaced.
    pub fn refresh(&self) {
        let Some(path) = self.shared.history.invalidate_current() else {
            return;
        };
        self.dispatch(path, true);
    }

    /// Waits until every in-flight navigation has finished.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of navigations still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    fn dispatch(&self, path: String, off_record: bool) {
        if !off_record && self.shared.history.is_currently_on(&path) {
            debug!(target: LOG_TARGET, path = %path, "skipped navigation as we are already on the same page");
            return;
        }

        debug!(target: LOG_TARGET, path = %path, "navigation started");
        self.shared.navigation_started.notify(path.clone());

        let (app, cancel) = {
            let context = self.context.read().unwrap_or_else(PoisonError::into_inner);
            (context.app.clone(), context.cancel.clone())
        };
        let handler = self.routes.find_handler(&path, app).unwrap_or_else(|| {
            info!(target: LOG_TARGET, path = %path, "no handler found");
            handler::not_found_handler()
        });

        let shared = Arc::clone(&self.shared);
        let started_at = Instant::now();
        debug!(target: LOG_TARGET, path = %path, "executing route handler");
        self.tracker.spawn_on(
            async move {
                let (response, should_cache) = handler::execute_handler(handler).await;
                if cancel.is_cancelled() {
                    debug!(target: LOG_TARGET, path = %path, "navigation cancelled");
                    return;
                }
                info!(
                    target: LOG_TARGET,
                    path = %path,
                    duration_ms = elapsed_ms(started_at),
                    should_cache,
                    "navigation completed"
                );

                // Rendering and subscriber fan-out may block.
                let completion = tokio::task::spawn_blocking(move || {
                    shared.complete(path, response, should_cache, off_record)
                });
                if let Err(err) = completion.await {
                    error!(target: LOG_TARGET, error = %err, "navigation completion failed");
                }
            },
            &self.runtime,
        );
    }
}

fn elapsed_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn normalize(path: &str) -> String {
    path.strip_prefix(SCHEME_PREFIX).unwrap_or(path).to_string()
}
