use scanline_core::preference::{HistorySizeSetting, Preferences};
use scanline_core::router::Router;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Loads the user's preferences, falling back to defaults when the file is
/// unreadable or malformed.
pub fn load_preferences() -> Preferences {
    match Preferences::load() {
        Ok(preferences) => preferences,
        Err(e) => {
            tracing::error!("Failed to load preferences, using defaults: {}", e);
            Preferences::default()
        }
    }
}

/// Builds a router whose history limit follows the returned setting.
///
/// Changing the setting later affects the next history push; no restart of
/// the router is needed.
pub fn build_router<C>(preferences: &Preferences, runtime: Handle) -> (Router<C>, HistorySizeSetting)
where
    C: Send + Sync + 'static,
{
    let history_size = preferences.history_size();
    let router = Router::new(runtime, Arc::new(history_size.clone()));
    (router, history_size)
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> Option<impl Drop> {
    Some(scanline_core::logging::init_logging(component, to_stderr))
}
