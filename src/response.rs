//! Outgoing HTTP response type.
//!
//! A [`Response`] starts as an empty `200 OK` and is handed by `&mut` down the
//! middleware chain to the handler. Whoever writes it last wins; a middleware
//! that short-circuits leaves exactly the response it wrote.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::warn;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`Response::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    FormData,     // application/x-www-form-urlencoded
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::FormData    => "application/x-www-form-urlencoded",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use pathwise::{Response, http::StatusCode};
///
/// let mut res = Response::new();
/// res.set_status(StatusCode::CREATED)
///    .set_header("location", "/users/42")
///    .json(br#"{"id":42}"#.to_vec());
/// assert_eq!(res.status(), StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// An empty `200 OK`.
    pub fn new() -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing any existing value of the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Body with `application/json`.
    pub fn json(&mut self, body: Vec<u8>) -> &mut Self {
        self.bytes(ContentType::Json, body)
    }

    /// Body with `text/plain; charset=utf-8`.
    pub fn text(&mut self, body: impl Into<String>) -> &mut Self {
        self.bytes(ContentType::Text, body.into().into_bytes())
    }

    /// Body with an explicit content type: XML, HTML, binary, SSE, etc.
    pub fn bytes(&mut self, content_type: ContentType, body: Vec<u8>) -> &mut Self {
        self.set_header("content-type", content_type.as_str());
        self.body = body;
        self
    }

    /// Drops the body and its content type, keeping status and other headers.
    pub fn clear_body(&mut self) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("content-type"));
        self.body.clear();
        self
    }

    /// Converts into the `http` type hyper serialises.
    ///
    /// Headers whose name or value is not valid on the wire are dropped with
    /// a warning.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        for (name, value) in self.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}
