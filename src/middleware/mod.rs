//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, request-id injection, header
//! inspection, before/after hooks.
//!
//! A middleware is a function from handler to handler: it receives the
//! [`Chain`] it wraps and returns a new handler with the same contract.
//!
//! ```rust
//! use onion::{Chain, Handler, Request};
//!
//! fn hooks(next: Chain) -> impl Handler {
//!     move |req: Request| {
//!         let next = next.clone();
//!         async move {
//!             tracing::info!("before");
//!             let res = next.call(req).await;
//!             tracing::info!("after");
//!             res
//!         }
//!     }
//! }
//! ```
//!
//! [`from_fn`] covers the common `(request, next)` shape without the clone
//! dance. [`Trace`] is the built-in request logger.
//!
//! # Ordering
//!
//! Middlewares registered first are the outermost layers: they see the
//! request first and the response last. See [`compose`].

mod trace;

pub use trace::Trace;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{Chain, Handler};
use crate::request::Request;
use crate::response::IntoResponse;

/// Wraps a handler, returning a new handler with additional behaviour.
///
/// Implemented for every `Fn(Chain) -> impl Handler`, for [`Trace`], and for
/// the adapter returned by [`from_fn`]. Implementations hold no per-request
/// state; one instance wraps every route registered after it.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: Chain) -> Chain;
}

impl<F, H> Middleware for F
where
    F: Fn(Chain) -> H + Send + Sync + 'static,
    H: Handler,
{
    fn wrap(&self, next: Chain) -> Chain {
        Chain::new(self(next))
    }
}

/// Nests `middlewares` around `handler`.
///
/// For `[m0, m1, …, mn]` the result behaves as `m0(m1(…mn(handler)…))`: the
/// fold starts from the handler and works outward in reverse registration
/// order, so `m0` ends up outermost. An empty slice yields the handler itself.
///
/// Composition is pure. Nothing runs until the returned chain is called.
pub fn compose(handler: impl Handler, middlewares: &[Arc<dyn Middleware>]) -> Chain {
    middlewares
        .iter()
        .rev()
        .fold(Chain::new(handler), |next, mw| mw.wrap(next))
}

// ── from_fn ───────────────────────────────────────────────────────────────────

/// Builds a middleware from an async `(request, next)` function.
///
/// ```rust
/// use onion::{App, Chain, Request};
/// use onion::middleware::from_fn;
///
/// async fn stamp(req: Request, next: Chain) -> onion::Response {
///     let mut res = next.call(req).await;
///     res.headers_mut().insert("x-served-by", http::HeaderValue::from_static("onion"));
///     res
/// }
///
/// let app = App::new().middleware(from_fn(stamp));
/// ```
///
/// Not calling `next` short-circuits the chain; whatever the function returns
/// becomes the response.
pub fn from_fn<F, Fut, R>(f: F) -> FromFn<F>
where
    F: Fn(Request, Chain) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    FromFn { f: Arc::new(f) }
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F> {
    f: Arc<F>,
}

impl<F, Fut, R> Middleware for FromFn<F>
where
    F: Fn(Request, Chain) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn wrap(&self, next: Chain) -> Chain {
        let f = Arc::clone(&self.f);
        Chain::new(move |req: Request| (*f)(req, next.clone()))
    }
}
