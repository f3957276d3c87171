//! Handler trait, type erasure, and the [`Chain`] handle.
//!
//! # How handlers are stored
//!
//! Every route ends up as one [`Chain`]: a terminal handler, possibly wrapped
//! by any number of middlewares. Routes with different concrete handler types
//! live side by side in the mux, so the concrete type is hidden behind a
//! trait object (`dyn ErasedHandler`).
//!
//! ```text
//! async fn hello(req: Request) -> Response { … }   ← user writes this
//!        ↓ app.route("/", hello)
//! hello.into_chain()                               ← Handler blanket impl
//!        ↓
//! Chain(Arc::new(FnHandler(hello)))                ← heap-allocated wrapper
//!        ↓ mw.wrap(chain) for each middleware, innermost first
//! Chain(Arc::new(FnHandler(|req| …chain.call(req)…)))
//!        ↓ stored in the mux
//! chain.call(req)  at request time                 ← one vtable dispatch per layer
//! ```
//!
//! Cloning a [`Chain`] is one atomic increment. Middlewares clone the chain
//! they wrap into each request future.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// A type-erased handler shared across concurrent requests.
///
/// A `Chain` is what a [`Middleware`](crate::middleware::Middleware) receives
/// (the rest of the chain it wraps) and what composition produces (the whole
/// chain for a route). Calling it runs every layer it contains.
#[derive(Clone)]
pub struct Chain(Arc<dyn ErasedHandler + Send + Sync + 'static>);

impl Chain {
    /// Erases any [`Handler`] into a `Chain`.
    pub fn new(handler: impl Handler) -> Self {
        handler.into_chain()
    }

    /// Runs the request through this chain.
    pub async fn call(&self, req: Request) -> Response {
        self.0.call(req).await
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Chain { .. }")
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// |req: Request| async move { … }
/// Chain
/// ```
///
/// The trait is **sealed**: only the impls in this module can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_chain(self) -> Chain;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_chain(self) -> Chain {
        Chain(Arc::new(FnHandler(self)))
    }
}

// A middleware may hand back the chain it was given, untouched.
impl private::Sealed for Chain {}

impl Handler for Chain {
    fn into_chain(self) -> Chain {
        self
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype bridging a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
