use super::LOG_TARGET;
use super::handler::{BoundHandler, Erased, ErasedHandler, RouteHandler};
use super::route::Route;
use crate::error::RegistrationError;
use regex::Regex;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error};

struct RouteEntry<C> {
    route: Route,
    matcher: Regex,
    handler: Arc<dyn ErasedHandler<C>>,
}

/// Ordered set of routes. Lookup is first match in registration order, so a
/// broader pattern registered earlier shadows a narrower one registered later.
pub struct RouteTable<C> {
    entries: RwLock<Vec<RouteEntry<C>>>,
}

impl<C: Send + Sync + 'static> RouteTable<C> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Registers `handler` for `pattern` and returns the route for building deep links.
    ///
    /// The handler must consume exactly as many path parameters as the pattern
    /// declares. A rejected route is logged and never becomes reachable.
    pub fn register<H, Args>(
        &self,
        pattern: impl Into<String>,
        handler: H,
    ) -> Result<Route, RegistrationError>
    where
        H: RouteHandler<C, Args>,
        Args: 'static,
    {
        let route = Route::new(pattern);
        let result = self.insert(&route, Arc::new(Erased::new(handler)));
        if let Err(err) = &result {
            error!(target: LOG_TARGET, pattern = route.pattern(), error = %err, "failed to register route");
        }
        result.map(|()| route)
    }

    fn insert(
        &self,
        route: &Route,
        handler: Arc<dyn ErasedHandler<C>>,
    ) -> Result<(), RegistrationError> {
        if handler.arity() != route.param_count() {
            return Err(RegistrationError::ArityMismatch {
                pattern: route.pattern().to_string(),
                pattern_params: route.param_count(),
                handler_params: handler.arity(),
            });
        }
        let matcher = route.compile()?;

        debug!(target: LOG_TARGET, pattern = route.pattern(), "route registered");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RouteEntry {
                route: route.clone(),
                matcher,
                handler,
            });
        Ok(())
    }

    /// Binds the first route accepting `path` to its captured parameters.
    ///
    /// The returned closure owns everything it needs and can run on any thread.
    pub fn find_handler(&self, path: &str, context: Option<Arc<C>>) -> Option<BoundHandler> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.iter().find(|e| e.matcher.is_match(path))?;

        let params: Vec<String> = entry
            .matcher
            .captures(path)?
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        let handler = Arc::clone(&entry.handler);

        Some(Box::new(move || handler.invoke(context.as_deref(), params)))
    }

    /// Registered patterns in lookup order.
    pub fn patterns(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.route.pattern().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Send + Sync + 'static> Default for RouteTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
