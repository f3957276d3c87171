//! Demo server: request logging, before/after hooks, and a hello-world route.
//!
//! Run with:
//!   RUST_LOG=info cargo run -- --addr :3000
//!
//! Try:
//!   curl http://localhost:3000/

use std::process::ExitCode;

use clap::Parser;
use onion::middleware::Trace;
use onion::{App, Chain, Handler, Request, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "onion", version, about = "Hello-world server behind a middleware chain")]
struct Args {
    /// Listen address: `host:port`, or `:port` for every interface.
    #[arg(long, env = "ONION_ADDR", default_value = ":3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let app = App::new()
        .middleware(Trace)
        .middleware(hooks)
        .route("/", hello);

    match Server::bind(&args.addr).serve(app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn hello(_req: Request) -> &'static str {
    "Hello, World!"
}

fn hooks(next: Chain) -> impl Handler {
    move |req: Request| {
        let next = next.clone();
        async move {
            info!("before handling request");
            let res = next.call(req).await;
            info!("after handling request");
            res
        }
    }
}
