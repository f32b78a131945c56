//! Error recovery.

use http::StatusCode;
use tracing::error;

use super::{Context, Middleware};
use crate::handler::HandlerResult;
use crate::request::Request;
use crate::response::Response;

/// Catches errors propagated by later units or the handler and answers
/// `500 Internal Server Error` instead.
///
/// The error is logged, never sent to the client. Place it early in the
/// chain: it only sees failures from units registered after it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Recover;

impl Middleware for Recover {
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
        if let Err(err) = cx.next(req, res) {
            error!(method = %req.method(), path = req.path(), error = %err, "unhandled error, responding 500");
            res.set_status(StatusCode::INTERNAL_SERVER_ERROR)
                .text("internal server error");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recover"
    }
}
