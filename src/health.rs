//! Built-in health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can it serve traffic? Failure → taken out of rotation. |
//!
//! ```rust
//! use pathwise::{Router, health};
//!
//! let app = Router::new()
//!     .get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! assert_eq!(app.len(), 2);
//! ```
//!
//! Register health routes before any catch-all parameter route of the same
//! shape, or the catch-all wins.

use crate::handler::HandlerResult;
use crate::request::Request;
use crate::response::Response;

/// Liveness probe: always `200 OK` with body `"ok"`.
pub fn liveness(_req: &mut Request, res: &mut Response) -> HandlerResult {
    res.text("ok");
    Ok(())
}

/// Readiness probe (default implementation): `200 OK` with body `"ready"`.
///
/// Replace it with your own handler when readiness depends on a warm-up or on
/// downstream services.
pub fn readiness(_req: &mut Request, res: &mut Response) -> HandlerResult {
    res.text("ready");
    Ok(())
}
