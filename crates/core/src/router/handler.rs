use super::LOG_TARGET;
use super::response::{IntoResponse, Response, internal_error};
use std::any::Any;
use std::marker::PhantomData;
use tracing::error;

/// Handler ready to run, with its context and path parameters already bound.
pub type BoundHandler = Box<dyn FnOnce() -> Option<Response> + Send>;

/// Marker for handlers whose first argument is the application context `&C`.
pub struct WithContext;

/// A page handler taking up to three path parameters as `String`s, optionally
/// preceded by `&C`.
///
/// `ARITY` is the number of path parameters the handler consumes; the route
/// table checks it against the pattern at registration time. `Args` only
/// disambiguates the blanket impls and is inferred from the closure signature.
pub trait RouteHandler<C, Args>: Send + Sync + 'static {
    const ARITY: usize;

    /// Calls the handler. Returns `None` when the handler needs a context that
    /// has not been provided yet, or when the handler itself returned nothing.
    fn invoke(&self, context: Option<&C>, params: Vec<String>) -> Option<Response>;
}

macro_rules! string_param {
    ($param:ident) => {
        String
    };
}

macro_rules! impl_route_handler {
    ($arity:literal $(, $param:ident)*) => {
        impl<C, F, R> RouteHandler<C, ($(string_param!($param),)*)> for F
        where
            F: Fn($(string_param!($param)),*) -> R + Send + Sync + 'static,
            R: IntoResponse,
        {
            const ARITY: usize = $arity;

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, _context: Option<&C>, params: Vec<String>) -> Option<Response> {
                let mut params = params.into_iter();
                $(let $param = params.next()?;)*
                self($($param),*).into_response()
            }
        }

        impl<C, F, R> RouteHandler<C, (WithContext, $(string_param!($param),)*)> for F
        where
            F: Fn(&C $(, string_param!($param))*) -> R + Send + Sync + 'static,
            R: IntoResponse,
        {
            const ARITY: usize = $arity;

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, context: Option<&C>, params: Vec<String>) -> Option<Response> {
                let Some(context) = context else {
                    error!(target: LOG_TARGET, "handler requires an application context but none was set");
                    return None;
                };
                let mut params = params.into_iter();
                $(let $param = params.next()?;)*
                self(context $(, $param)*).into_response()
            }
        }
    };
}

impl_route_handler!(0);
impl_route_handler!(1, a);
impl_route_handler!(2, a, b);
impl_route_handler!(3, a, b, c);

/// Object-safe view of a [`RouteHandler`] so the table can store mixed arities.
pub(crate) trait ErasedHandler<C>: Send + Sync {
    fn arity(&self) -> usize;
    fn invoke(&self, context: Option<&C>, params: Vec<String>) -> Option<Response>;
}

pub(crate) struct Erased<H, Args> {
    handler: H,
    _args: PhantomData<fn() -> Args>,
}

impl<H, Args> Erased<H, Args> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _args: PhantomData,
        }
    }
}

impl<C, H, Args> ErasedHandler<C> for Erased<H, Args>
where
    H: RouteHandler<C, Args>,
{
    fn arity(&self) -> usize {
        H::ARITY
    }

    fn invoke(&self, context: Option<&C>, params: Vec<String>) -> Option<Response> {
        self.handler.invoke(context, params)
    }
}

pub(crate) fn not_found_handler() -> BoundHandler {
    Box::new(|| Some(super::response::not_found()))
}

/// Runs `handler` on the blocking pool and turns every failure into the
/// internal error page.
///
/// Returns the response and whether it may be cached in history. A panic, a
/// missing response or a response carrying an error are never cacheable.
pub(crate) async fn execute_handler(handler: BoundHandler) -> (Response, bool) {
    match tokio::task::spawn_blocking(handler).await {
        Ok(Some(mut response)) => match response.error.take() {
            Some(err) => {
                error!(
                    target: LOG_TARGET,
                    title = %response.page_title,
                    error = %format!("{err:#}"),
                    "handler failed"
                );
                (internal_error(&err), false)
            }
            None => (response, true),
        },
        Ok(None) => {
            error!(target: LOG_TARGET, "handler returned no result");
            let err = anyhow::anyhow!("route handler did not generate any response");
            (internal_error(&err), false)
        }
        Err(join_err) => {
            let message = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                join_err.to_string()
            };
            error!(target: LOG_TARGET, error = %message, "handler panicked");
            (internal_error(&anyhow::anyhow!(message)), false)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
