//! Per-request tracing span.

use std::time::Instant;

use tracing::{error, info, info_span};

use super::{Context, Middleware};
use crate::handler::HandlerResult;
use crate::request::Request;
use crate::response::Response;

/// Opens an `info` span carrying the method and path, and logs the status and
/// latency once the rest of the chain returns.
///
/// Register it first so the span covers every later unit and the handler.
///
/// Like every chain, it only runs for requests that matched a route. Requests
/// that match nothing fail with `RouteNotFound` before any middleware runs,
/// so 404s get no span and no log line from here.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        let _entered = span.enter();
        let started = Instant::now();

        let result = cx.next(req, res);

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(()) => info!(status = res.status().as_u16(), latency_ms, "request completed"),
            Err(e) => error!(error = %e, latency_ms, "request failed"),
        }
        result
    }

    fn name(&self) -> &'static str {
        "trace"
    }
}
