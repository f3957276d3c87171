//! # onion
//!
//! A minimal HTTP router with ordered, composable middleware.
//!
//! ## The contract
//!
//! You register middlewares, then routes. Every route registration wraps its
//! handler in the middlewares registered so far, first-registered outermost,
//! and stores the composed chain under the route's pattern. At request time
//! the path picks a chain and the chain runs. That is all.
//!
//! hyper and tokio own everything below that: connections, HTTP parsing,
//! HTTP/1.1 and HTTP/2. onion does not reimplement any of it.
//!
//! What onion adds on top is small. Each route's middleware chain is folded
//! together once, when the route is registered. Paths match either exactly
//! (`/about`) or by subtree (`/static/`), and the longest subtree wins. When
//! the process gets a stop signal, the server stops accepting and lets open
//! connections finish.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use onion::{App, Chain, Handler, Request, Server};
//! use onion::middleware::Trace;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = App::new()
//!         .middleware(Trace)
//!         .middleware(hooks)
//!         .route("/", hello);
//!
//!     Server::bind(":3000").serve(app).await.unwrap();
//! }
//!
//! async fn hello(_req: Request) -> &'static str {
//!     "Hello, World!"
//! }
//!
//! fn hooks(next: Chain) -> impl Handler {
//!     move |req: Request| {
//!         let next = next.clone();
//!         async move {
//!             tracing::info!("before handling request");
//!             let res = next.call(req).await;
//!             tracing::info!("after handling request");
//!             res
//!         }
//!     }
//! }
//! ```

mod app;
mod error;
mod handler;
mod mux;
mod request;
mod response;
mod server;

pub mod middleware;

pub use app::App;
pub use error::Error;
pub use handler::{Chain, Handler};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use server::Server;
