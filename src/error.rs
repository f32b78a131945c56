//! Unified error type.

use thiserror::Error;

/// A boxed, thread-safe error: what handlers and middleware return.
///
/// Anything implementing `std::error::Error + Send + Sync` converts into it
/// with `?`, and so do `&str` and `String`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by pathwise's fallible operations.
///
/// Application-level outcomes (401, 422, etc.) are expressed by writing the
/// [`Response`](crate::Response), not as `Error`s. This type surfaces
/// registration mistakes, unmatched requests, failures that escaped the
/// middleware chain, and server I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// A path template could not be compiled. Raised at registration time;
    /// the offending route is not added.
    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPathPattern { pattern: String, reason: &'static str },

    /// No registered route matches the method and path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: http::Method, path: String },

    /// A middleware called `next` again after its downstream already ran.
    #[error("middleware continuation invoked more than once")]
    NextCalledTwice,

    /// A handler or middleware failed and nothing in the chain recovered.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_pattern(pattern: &str, reason: &'static str) -> Self {
        Self::InvalidPathPattern { pattern: pattern.to_owned(), reason }
    }

    /// `true` for [`Error::RouteNotFound`]; callers usually map it to a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RouteNotFound { .. })
    }
}
