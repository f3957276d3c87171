//! Per-request logging.

use std::time::Instant;

use tracing::{Instrument, info, info_span};

use super::Middleware;
use crate::handler::Chain;
use crate::request::Request;

/// Logs every request it wraps.
///
/// Opens an `info`-level `request` span carrying the method and path, emits
/// `started` on the way in and `completed` (with status and latency) on the
/// way out. Register it first to have the span cover every other layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn wrap(&self, next: Chain) -> Chain {
        Chain::new(move |req: Request| {
            let next = next.clone();
            let span = info_span!("request", method = %req.method(), path = %req.path());
            async move {
                let start = Instant::now();
                info!("started");
                let res = next.call(req).await;
                info!(
                    status = res.status_code().as_u16(),
                    latency = ?start.elapsed(),
                    "completed"
                );
                res
            }
            .instrument(span)
        })
    }
}
