//! Handler signature and type erasure.
//!
//! # How handlers are stored
//!
//! The router holds handlers of *different* closure types in one `Vec<Route>`.
//! Rust collections hold one concrete type, so every handler is erased behind
//! a trait object and shared through an `Arc`:
//!
//! ```text
//! fn hello(req: &mut Request, res: &mut Response) -> HandlerResult { … }
//!        ↓ router.get("/", hello)
//! Arc::new(hello)                                   ← heap-allocated once
//!        ↓  stored as BoxedHandler = Arc<dyn Fn(..) + Send + Sync>
//! (route.handler)(req, res)  at request time       ← one vtable dispatch
//! ```
//!
//! Handlers are plain synchronous functions. The server runs each dispatch on
//! a blocking worker, so a handler that blocks only blocks its own request.

use std::any::Any;
use std::sync::Arc;

use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;

/// What handlers and middleware return.
///
/// `Ok(())` means "the response is written". An `Err` travels back up the
/// middleware chain unchanged until something recovers it.
pub type HandlerResult = Result<(), BoxError>;

/// A type-erased route handler shared across concurrent requests.
pub(crate) type BoxedHandler = Arc<dyn Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync>;

/// An opaque, shared application value threaded through a dispatch to the
/// terminal handler (a database pool, the server's settings, ...).
///
/// Handlers read it back with [`Request::app`].
pub type AppContext = Arc<dyn Any + Send + Sync>;

pub(crate) fn boxed<H>(handler: H) -> BoxedHandler
where
    H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(handler)
}
