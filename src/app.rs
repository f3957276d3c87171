//! The application: ordered middlewares plus a path multiplexer.
//!
//! Each [`App::route`] call composes the middlewares registered *so far*
//! around its handler and stores the result. Later middlewares never reach
//! back into routes that already exist.

use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::debug;

use crate::handler::Handler;
use crate::middleware::{self, Middleware};
use crate::mux::{Mux, Resolved};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `self` so calls chain naturally.
///
/// ```rust
/// use onion::{App, Request};
/// use onion::middleware::Trace;
///
/// let app = App::new()
///     .middleware(Trace)
///     .route("/", |_req: Request| async { "Hello, World!" })
///     .route("/static/", |req: Request| async move { format!("file {}", req.path()) });
/// ```
pub struct App {
    middlewares: Vec<Arc<dyn Middleware>>,
    mux: Mux,
}

impl App {
    pub fn new() -> Self {
        Self { middlewares: Vec::new(), mux: Mux::new() }
    }

    /// Appends a middleware. It wraps every route registered after this call.
    pub fn middleware(mut self, mw: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(mw));
        self
    }

    /// Registers `handler` under `pattern`, wrapped by the current middlewares.
    ///
    /// `pattern` is either an exact path (`/about`) or, with a trailing slash,
    /// a subtree (`/static/`). Registering the same pattern again replaces the
    /// earlier handler.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` does not start with `/`.
    pub fn route(mut self, pattern: &str, handler: impl Handler) -> Self {
        let chain = middleware::compose(handler, &self.middlewares);
        let replaced = self.mux.insert(pattern, chain);
        debug!(pattern, middlewares = self.middlewares.len(), replaced, "route registered");
        self
    }

    /// Dispatches one request.
    ///
    /// Matched requests run through the route's composed chain. Redirects,
    /// `404 Not Found` and malformed targets are answered directly and never
    /// touch a middleware.
    pub async fn call(&self, req: Request) -> Response {
        if req.path() == "*" {
            return Response::status(StatusCode::BAD_REQUEST);
        }

        let clean = *req.method() != Method::CONNECT;
        match self.mux.resolve(req.path(), req.query(), clean) {
            Resolved::Chain(chain) => chain.call(req).await,
            Resolved::Redirect(location) => {
                debug!(from = req.path(), to = %location, "redirecting");
                Response::redirect(&location)
            }
            Resolved::NotFound => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .text("404 page not found\n"),
            Resolved::BadRequest => Response::status(StatusCode::BAD_REQUEST),
        }
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}
