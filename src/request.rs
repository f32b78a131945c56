//! Incoming HTTP request type.

use std::any::Any;
use std::collections::HashMap;

use bytes::Bytes;
use http::{Extensions, Method};

use crate::handler::AppContext;

/// Path parameters extracted by the router, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// An incoming HTTP request, already parsed by the connection layer.
///
/// Middleware may mutate it on the way in: add headers, stash values in
/// [`extensions`](Request::extensions_mut) for later middleware or the
/// handler to pick up.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) target: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: Params,
    pub(crate) extensions: Extensions,
    pub(crate) app: Option<AppContext>,
}

impl Request {
    /// A request with no headers and an empty body. `target` is the request
    /// target as sent on the wire, query string included.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            params: Params::new(),
            extensions: Extensions::new(),
            app: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn target(&self) -> &str { &self.target }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The request path with any `?query` suffix removed.
    pub fn path(&self) -> &str {
        self.target.split_once('?').map_or(self.target.as_str(), |(path, _)| path)
    }

    /// The raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &Params { &self.params }

    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// The application context the router was configured with, if it is a `T`.
    ///
    /// Only set once the request reaches its handler.
    pub fn app<T: Any>(&self) -> Option<&T> {
        self.app.as_deref()?.downcast_ref::<T>()
    }
}
