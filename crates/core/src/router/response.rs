use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

pub const INTERNAL_ERROR_TITLE: &str = "Internal Error";
pub const NOT_FOUND_TITLE: &str = "Not Found";
const STATUS_ICON: &str = "sentiment-dissatisfied-symbolic";

/// Opaque, cheaply clonable reference to something the UI layer rendered.
///
/// The router never looks inside; the UI downcasts to its own widget type.
#[derive(Clone)]
pub struct ViewHandle(Arc<dyn Any + Send + Sync>);

impl ViewHandle {
    pub fn new<T: Any + Send + Sync>(view: T) -> Self {
        Self(Arc::new(view))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewHandle(..)")
    }
}

/// Description of a view produced by a handler, turned into a [`ViewHandle`]
/// once the navigation is accepted.
pub trait Renderable: Send {
    fn render(self: Box<Self>) -> ViewHandle;
}

/// Full-page status message, used for the built-in error and not-found pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPage {
    pub title: String,
    pub description: String,
    pub icon_name: String,
}

impl StatusPage {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            icon_name: STATUS_ICON.to_string(),
        }
    }
}

impl Renderable for StatusPage {
    fn render(self: Box<Self>) -> ViewHandle {
        ViewHandle::new(*self)
    }
}

/// What a route handler hands back to the router. Consumed once.
#[derive(Default)]
pub struct Response {
    pub page_title: String,
    pub view: Option<Box<dyn Renderable>>,
    pub toolbar: Option<Box<dyn Renderable>>,
    pub expires_at: Option<Instant>,
    pub error: Option<anyhow::Error>,
}

impl Response {
    pub fn new(page_title: impl Into<String>) -> Self {
        Self {
            page_title: page_title.into(),
            ..Default::default()
        }
    }

    /// A response that only carries a domain error; the router replaces it with
    /// the internal error page.
    pub fn from_error(page_title: impl Into<String>, error: impl Into<anyhow::Error>) -> Self {
        Self {
            page_title: page_title.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_view(mut self, view: impl Renderable + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    pub fn with_toolbar(mut self, toolbar: impl Renderable + 'static) -> Self {
        self.toolbar = Some(Box::new(toolbar));
        self
    }

    pub fn expires_at(mut self, at: Instant) -> Self {
        self.expires_at = Some(at);
        self
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("page_title", &self.page_title)
            .field("has_view", &self.view.is_some())
            .field("has_toolbar", &self.toolbar.is_some())
            .field("expires_at", &self.expires_at)
            .field("error", &self.error)
            .finish()
    }
}

/// Return types accepted from route handlers.
///
/// `None` means the handler produced nothing, which the router treats as a failure.
pub trait IntoResponse {
    fn into_response(self) -> Option<Response>;
}

impl IntoResponse for Response {
    fn into_response(self) -> Option<Response> {
        Some(self)
    }
}

impl IntoResponse for Option<Response> {
    fn into_response(self) -> Option<Response> {
        self
    }
}

pub(crate) fn internal_error(error: &anyhow::Error) -> Response {
    Response::new(INTERNAL_ERROR_TITLE).with_view(StatusPage::new(
        INTERNAL_ERROR_TITLE,
        format!(
            "Unfortunately an error occurred while loading this view. Please try again later. \
             If the error persists, please open an issue!\n\nError Message: {error}"
        ),
    ))
}

pub(crate) fn not_found() -> Response {
    Response::new(NOT_FOUND_TITLE).with_view(StatusPage::new(
        "Not found",
        "The requested deeplink did not have any available handlers.",
    ))
}
