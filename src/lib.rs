//! # pathwise
//!
//! The request-dispatch core of a small HTTP framework: a pattern router with
//! regex-constrained parameters and a continuation-style middleware chain.
//!
//! ## Routing
//!
//! Templates are `/`-separated literals and parameters:
//!
//! ```text
//! /users/:id([0-9]+)/posts/:postId
//! ```
//!
//! `:name` binds a segment, `:name(pattern)` binds it only if the whole
//! segment matches `pattern` (evaluated by the [`regex`] crate). Routes are
//! tried in registration order and the first match wins. A route matches only
//! requests with exactly as many segments as its template.
//!
//! ## Middleware
//!
//! A [`Chain`](middleware::Chain) wraps the handler. Each unit decides
//! whether to call `next`; not calling it short-circuits the request. The
//! router has one global chain, and any route or mounted [`Group`] may carry
//! its own chain, which then runs instead of the global one.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pathwise::{HandlerResult, Request, Response, Router, Server};
//! use pathwise::middleware::{recover::Recover, trace::Trace};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .middleware(Trace)
//!         .middleware(Recover)
//!         .get("/users/:id([0-9]+)", get_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! fn get_user(req: &mut Request, res: &mut Response) -> HandlerResult {
//!     let id = req.param("id").unwrap_or("unknown");
//!     res.json(format!(r#"{{"id":{id}}}"#).into_bytes());
//!     Ok(())
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod constraint;
pub mod health;
pub mod middleware;
pub mod pattern;

pub use error::{BoxError, Error};
pub use handler::{AppContext, HandlerResult};
pub use request::{Params, Request};
pub use response::{ContentType, Response};
pub use router::{Group, Match, Route, Router};
pub use server::{Server, serve_listener};

pub use http;
