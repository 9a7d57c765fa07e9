//! End-to-end navigation behavior of the router

use scanline_core::router::{
    HistoryEntry, INTERNAL_ERROR_TITLE, NOT_FOUND_TITLE, Renderable, Response, Router,
    StatusPage, ViewHandle,
};
use scanline_signals::CONTINUE;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

struct App {
    server: &'static str,
}

struct Page(String);

impl Renderable for Page {
    fn render(self: Box<Self>) -> ViewHandle {
        ViewHandle::new(self.0)
    }
}

fn page(title: &str) -> Response {
    Response::new(title).with_view(Page(title.to_string()))
}

fn router(max_history: usize) -> Router<App> {
    Router::new(Handle::current(), Arc::new(max_history))
}

fn counting_route(router: &Router<App>, pattern: &str) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let title = pattern.to_string();
    router
        .route(pattern, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            page(&title)
        })
        .unwrap();
    calls
}

fn record_completions(router: &Router<App>) -> Arc<Mutex<Vec<HistoryEntry>>> {
    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completed);
    router.navigation_completed().on(move |entry| {
        sink.lock().unwrap().push(entry.clone());
        CONTINUE
    });
    completed
}

fn entry_paths(router: &Router<App>) -> Vec<String> {
    router
        .history()
        .entries()
        .into_iter()
        .map(|e| e.path)
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registration_rejects_wrong_parameter_count() {
    let router = router(10);
    assert!(router.route("movie/:server/:ratingKey", || page("x")).is_err());
    assert!(
        router
            .route("movie/:server/:ratingKey", |_: &App, _: String| page("x"))
            .is_err()
    );
    assert!(
        router
            .route("movie/:server/:ratingKey", |_: &App, _: String, _: String| page("x"))
            .is_ok()
    );
    assert_eq!(router.routes().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_receives_path_parameters_in_order() {
    let router = router(10);
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    router
        .route(
            "movie/:server/:ratingKey",
            move |server: String, rating_key: String| {
                sink.lock().unwrap().push((server, rating_key));
                page("Movie")
            },
        )
        .unwrap();

    router.navigate("movie/srv1/123");
    router.wait().await;

    assert_eq!(
        *received.lock().unwrap(),
        vec![("srv1".to_string(), "123".to_string())]
    );
    assert_eq!(router.current().unwrap().path, "movie/srv1/123");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scheme_prefix_is_stripped() {
    let router = router(10);
    let calls = counting_route(&router, "search");

    router.navigate("plex://search");
    router.wait().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(router.history().is_currently_on("search"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_navigation_to_current_page_is_skipped() {
    let router = router(10);
    let calls = counting_route(&router, "home");

    router.navigate("home");
    router.wait().await;
    router.navigate("home");
    router.wait().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(router.history().entries_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_navigate_clearing_always_reinvokes() {
    let router = router(10);
    let home = counting_route(&router, "home");
    counting_route(&router, "search");

    router.navigate("search");
    router.wait().await;
    router.navigate("home");
    router.wait().await;
    router.navigate_clearing("home");
    router.wait().await;
    router.navigate_clearing("home");
    router.wait().await;

    assert_eq!(home.load(Ordering::SeqCst), 3);
    assert!(router.current().is_none());
    assert_eq!(router.history().entries_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_back_restores_cached_page_without_reinvoking() {
    let router = router(10);
    let a = counting_route(&router, "a");
    counting_route(&router, "b");
    let completed = record_completions(&router);

    router.navigate("a");
    router.wait().await;
    router.navigate("b");
    router.wait().await;

    router.back();
    router.wait().await;

    let current = router.current().unwrap();
    assert_eq!(current.path, "a");
    assert!(current.view.is_some());
    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(router.history().entries_count(), 0);

    let last = completed.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last.path, "a");
    assert_eq!(last.view.unwrap().downcast_ref::<String>().unwrap(), "a");

    // Nothing left to go back to.
    router.back();
    router.wait().await;
    assert_eq!(router.current().unwrap().path, "a");
    assert_eq!(completed.lock().unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_back_regenerates_failed_page() {
    let router = router(10);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    router
        .route("flaky", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Response::from_error("Flaky", anyhow::anyhow!("server unreachable"))
        })
        .unwrap();
    counting_route(&router, "b");

    router.navigate("flaky");
    router.wait().await;
    router.navigate("b");
    router.wait().await;
    router.back();
    router.wait().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let current = router.current().unwrap();
    assert_eq!(current.path, "flaky");
    assert!(current.view.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_panicking_handler_yields_stale_internal_error_page() {
    let router = router(10);
    router
        .route("boom", || -> Response { panic!("handler exploded") })
        .unwrap();
    let completed = record_completions(&router);

    router.navigate("boom");
    router.wait().await;

    let entry = completed.lock().unwrap().pop().unwrap();
    assert_eq!(entry.page_title, INTERNAL_ERROR_TITLE);
    assert!(entry.expires_at.unwrap() <= Instant::now());
    let status = entry.view.unwrap();
    assert!(
        status
            .downcast_ref::<StatusPage>()
            .unwrap()
            .description
            .contains("handler exploded")
    );
    assert_eq!(router.current().unwrap().page_title, INTERNAL_ERROR_TITLE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_without_response_is_an_internal_error() {
    let router = router(10);
    router.route("empty", || -> Option<Response> { None }).unwrap();
    let completed = record_completions(&router);

    router.navigate("empty");
    router.wait().await;

    let entry = completed.lock().unwrap().pop().unwrap();
    assert_eq!(entry.page_title, INTERNAL_ERROR_TITLE);
    assert!(entry.expires_at.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_path_shows_not_found_page() {
    let router = router(10);
    let completed = record_completions(&router);

    router.navigate("does/not/exist");
    router.wait().await;

    let entry = completed.lock().unwrap().pop().unwrap();
    assert_eq!(entry.page_title, NOT_FOUND_TITLE);
    assert!(entry.expires_at.is_none());
    assert_eq!(router.current().unwrap().path, "does/not/exist");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_history_keeps_most_recent_entries() {
    let router = router(2);
    for path in ["a", "b", "c", "d"] {
        counting_route(&router, path);
    }

    for path in ["a", "b", "c", "d"] {
        router.navigate(path);
        router.wait().await;
    }

    assert_eq!(entry_paths(&router), vec!["b", "c"]);
    assert_eq!(router.current().unwrap().path, "d");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_reinvokes_current_page() {
    let router = router(10);
    let calls = counting_route(&router, "x");
    let completed = record_completions(&router);

    router.navigate("x");
    router.wait().await;
    router.refresh();
    router.wait().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(completed.lock().unwrap().len(), 2);
    let current = router.current().unwrap();
    assert_eq!(current.path, "x");
    assert!(current.view.is_none());
    assert_eq!(router.history().entries_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refresh_without_current_page_is_noop() {
    let router = router(10);
    let completed = record_completions(&router);
    router.refresh();
    router.wait().await;
    assert!(completed.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_navigation_is_discarded() {
    let router = router(10);
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    router
        .route("slow", move || {
            let _ = release_rx.lock().unwrap().recv();
            page("Slow")
        })
        .unwrap();
    let completed = record_completions(&router);

    let token = CancellationToken::new();
    router.set_context(Arc::new(App { server: "srv1" }), token.clone());

    router.navigate("slow");
    token.cancel();
    release_tx.send(()).unwrap();
    router.wait().await;

    assert!(completed.lock().unwrap().is_empty());
    assert!(router.current().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_context_is_passed_to_handlers() {
    let router = router(10);
    router
        .route("library/:section", |app: &App, section: String| {
            page(&format!("{}/{}", app.server, section))
        })
        .unwrap();
    router.set_context(Arc::new(App { server: "srv9" }), CancellationToken::new());

    router.navigate("library/films");
    router.wait().await;

    assert_eq!(router.current().unwrap().page_title, "srv9/films");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_context_handler_before_set_context_fails_gracefully() {
    let router = router(10);
    router
        .route("library/:section", |app: &App, section: String| {
            page(&format!("{}/{}", app.server, section))
        })
        .unwrap();

    router.navigate("library/films");
    router.wait().await;

    assert_eq!(router.current().unwrap().page_title, INTERNAL_ERROR_TITLE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_started_precedes_completed() {
    let router = router(10);
    counting_route(&router, "a");
    let events = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&events);
    router.navigation_started().on(move |path| {
        sink.lock().unwrap().push(format!("started:{path}"));
        CONTINUE
    });
    let sink = Arc::clone(&events);
    router.navigation_completed().on(move |entry| {
        sink.lock().unwrap().push(format!("completed:{}", entry.path));
        CONTINUE
    });

    router.navigate("a");
    router.wait().await;

    assert_eq!(*events.lock().unwrap(), vec!["started:a", "completed:a"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_history_updated_reports_back_stack() {
    let router = router(10);
    counting_route(&router, "a");
    counting_route(&router, "b");
    let counts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&counts);
    router.history_updated().on(move |history| {
        sink.lock().unwrap().push(history.entries_count());
        CONTINUE
    });

    router.navigate("a");
    router.wait().await;
    router.navigate("b");
    router.wait().await;
    router.back();
    router.wait().await;

    assert_eq!(*counts.lock().unwrap(), vec![0, 1, 0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_in_flight_counts_running_navigations() {
    let router = router(10);
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    router
        .route("slow", move || {
            let _ = release_rx.lock().unwrap().recv();
            page("Slow")
        })
        .unwrap();

    router.navigate("slow");
    assert_eq!(router.in_flight(), 1);

    release_tx.send(()).unwrap();
    router.wait().await;
    assert_eq!(router.in_flight(), 0);
    assert_eq!(router.current().unwrap().path, "slow");
}
