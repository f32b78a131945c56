//! Cross-origin resource sharing.

use http::{Method, StatusCode};
use tracing::debug;

use super::{Context, Middleware};
use crate::handler::HandlerResult;
use crate::request::Request;
use crate::response::Response;

/// Adds CORS headers to every response and answers preflight requests.
///
/// A preflight (`OPTIONS` with `access-control-request-method`) is answered
/// with `204 No Content` and never reaches later units or the handler. The
/// router only runs a chain for matched routes, so register an `OPTIONS`
/// route (see [`Router::options`](crate::Router::options)) for paths that
/// must accept preflights.
///
/// ```rust
/// use pathwise::middleware::cors::Cors;
/// use pathwise::http::Method;
///
/// let cors = Cors::new("https://app.example.com")
///     .allow_methods(&[Method::GET, Method::POST])
///     .allow_headers(&["content-type", "authorization"])
///     .max_age(600);
/// ```
#[derive(Clone, Debug)]
pub struct Cors {
    origin: String,
    methods: String,
    headers: String,
    max_age: Option<u32>,
}

impl Cors {
    /// Allows `origin` with the common methods and the `content-type` and
    /// `authorization` request headers.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            methods: "GET, POST, PUT, PATCH, DELETE, OPTIONS".to_owned(),
            headers: "content-type, authorization".to_owned(),
            max_age: None,
        }
    }

    /// Any origin.
    pub fn permissive() -> Self {
        Self::new("*")
    }

    pub fn allow_methods(mut self, methods: &[Method]) -> Self {
        self.methods = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
        self
    }

    pub fn allow_headers(mut self, headers: &[&str]) -> Self {
        self.headers = headers.join(", ");
        self
    }

    /// How long, in seconds, browsers may cache a preflight answer.
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    fn is_preflight(req: &Request) -> bool {
        req.method() == Method::OPTIONS && req.header("access-control-request-method").is_some()
    }
}

impl Middleware for Cors {
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
        res.set_header("access-control-allow-origin", &self.origin);
        if self.origin != "*" {
            res.set_header("vary", "origin");
        }

        if !Self::is_preflight(req) {
            return cx.next(req, res);
        }

        debug!(path = req.path(), "answering CORS preflight");
        res.set_status(StatusCode::NO_CONTENT)
            .set_header("access-control-allow-methods", &self.methods)
            .set_header("access-control-allow-headers", &self.headers)
            .clear_body();
        if let Some(max_age) = self.max_age {
            res.set_header("access-control-max-age", &max_age.to_string());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cors"
    }
}
