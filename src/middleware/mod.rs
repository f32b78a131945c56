//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, CORS, authentication, error
//! recovery.
//!
//! # The continuation model
//!
//! A [`Chain`] is an ordered list of [`Middleware`] units. Executing it builds
//! a fresh [`Context`] that remembers how far the request has travelled. Each
//! unit receives that context and decides whether to call
//! [`Context::next`]:
//!
//! ```text
//! A.before → B.before → handler → B.after → A.after
//! ```
//!
//! Code before a unit's `next` call runs in registration order, code after it
//! runs in reverse as the stack unwinds. A unit that returns without calling
//! `next` ends the request there: nothing after it runs, and the response is
//! whatever it wrote.
//!
//! Built-in middleware:
//! - [`trace::Trace`]: per-request span with method, path, status, latency
//! - [`cors::Cors`]: CORS headers and preflight short-circuit
//! - [`auth::BearerAuth`]: bearer-token gate
//! - [`recover::Recover`]: turns propagated errors into a 500

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{AppContext, HandlerResult};
use crate::request::Request;
use crate::response::Response;

pub mod auth;
pub mod cors;
pub mod recover;
pub mod trace;

/// The end of a chain: the route handler, plus the optional app context.
pub type Terminal<'a> =
    dyn Fn(&mut Request, &mut Response, Option<&AppContext>) -> HandlerResult + 'a;

/// One unit of a middleware chain.
///
/// Implement this on your own types, or wrap a closure with [`from_fn`].
pub trait Middleware: Send + Sync + 'static {
    /// Handles the request. Call `cx.next(req, res)` to pass control on.
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult;

    /// Name shown in trace logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of middleware.
///
/// Cloning a chain is cheap: units are shared, not copied.
#[derive(Clone, Default)]
pub struct Chain {
    units: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit. It runs after every unit already in the chain.
    pub fn push(&mut self, middleware: impl Middleware) -> &mut Self {
        self.units.push(Arc::new(middleware));
        self
    }

    /// Builder form of [`push`](Chain::push).
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Runs the chain, ending in `terminal`.
    pub fn execute(&self, req: &mut Request, res: &mut Response, terminal: &Terminal<'_>) -> HandlerResult {
        Context::new(&self.units, terminal, None).next(req, res)
    }

    /// Runs the chain and hands `app` to `terminal` once every unit has
    /// passed control on. Middleware can read it through
    /// [`Context::app_context`].
    pub fn execute_with_context(
        &self,
        req: &mut Request,
        res: &mut Response,
        terminal: &Terminal<'_>,
        app: &AppContext,
    ) -> HandlerResult {
        Context::new(&self.units, terminal, Some(app)).next(req, res)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.units.iter().map(|m| m.name())).finish()
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Per-dispatch cursor over a chain.
///
/// Created fresh for every execution and dropped when it returns. `index`
/// counts the units started so far and never goes back.
pub struct Context<'a> {
    units: &'a [Arc<dyn Middleware>],
    terminal: &'a Terminal<'a>,
    app: Option<&'a AppContext>,
    index: usize,
    // Value of `index` right after the unit currently on the stack started.
    // A legitimate `next` call always finds `index == active`.
    active: usize,
}

impl<'a> Context<'a> {
    fn new(units: &'a [Arc<dyn Middleware>], terminal: &'a Terminal<'a>, app: Option<&'a AppContext>) -> Self {
        Self { units, terminal, app, index: 0, active: 0 }
    }

    /// Passes control to the next unit, or to the terminal handler once the
    /// units are exhausted.
    ///
    /// Each unit may call this at most once. A second call, made after the
    /// rest of the chain already ran or short-circuited, invokes nothing and
    /// returns [`Error::NextCalledTwice`].
    pub fn next(&mut self, req: &mut Request, res: &mut Response) -> HandlerResult {
        if self.index != self.active {
            return Err(Box::new(Error::NextCalledTwice));
        }

        let units = self.units;
        let Some(unit) = units.get(self.index) else {
            // Past the end: the terminal runs once, then the cursor is spent.
            self.index += 1;
            tracing::trace!("entering handler");
            return (self.terminal)(req, res, self.app);
        };

        self.index += 1;
        let caller = std::mem::replace(&mut self.active, self.index);
        tracing::trace!(middleware = unit.name(), position = self.index, "entering middleware");
        let result = unit.invoke(req, res, self);
        self.active = caller;
        result
    }

    /// The application context this dispatch carries, if any.
    pub fn app_context(&self) -> Option<&AppContext> {
        self.app
    }

    /// How many units have been started so far.
    pub fn position(&self) -> usize {
        self.index.min(self.units.len())
    }
}

// ── Closures as middleware ────────────────────────────────────────────────────

/// Wraps a closure as [`Middleware`].
///
/// ```rust
/// use pathwise::middleware::{Chain, from_fn};
///
/// let chain = Chain::new().with(from_fn(|req, res, cx| {
///     res.set_header("x-served-by", "pathwise");
///     cx.next(req, res)
/// }));
/// assert_eq!(chain.len(), 1);
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Request, &mut Response, &mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    FromFn(f)
}

/// Middleware built by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> Middleware for FromFn<F>
where
    F: Fn(&mut Request, &mut Response, &mut Context<'_>) -> HandlerResult + Send + Sync + 'static,
{
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
        (self.0)(req, res, cx)
    }

    fn name(&self) -> &'static str {
        "from_fn"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, StatusCode};

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Record {
        name: &'static str,
        log: Log,
    }

    impl Middleware for Record {
        fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
            self.log.lock().unwrap().push(format!("{}:before", self.name));
            cx.next(req, res)?;
            self.log.lock().unwrap().push(format!("{}:after", self.name));
            Ok(())
        }
    }

    fn record(name: &'static str, log: &Log) -> Record {
        Record { name, log: Arc::clone(log) }
    }

    fn request() -> Request {
        Request::new(Method::GET, "/")
    }

    #[test]
    fn units_nest_around_the_handler() {
        let log = Log::default();
        let chain = Chain::new().with(record("A", &log)).with(record("B", &log));
        let handler_log = Arc::clone(&log);
        let terminal = move |_: &mut Request, res: &mut Response, _: Option<&AppContext>| -> HandlerResult {
            handler_log.lock().unwrap().push("H".to_owned());
            res.text("done");
            Ok(())
        };

        let mut res = Response::new();
        chain.execute(&mut request(), &mut res, &terminal).unwrap();

        assert_eq!(*log.lock().unwrap(), ["A:before", "B:before", "H", "B:after", "A:after"]);
        assert_eq!(res.body(), b"done");
    }

    #[test]
    fn unit_that_skips_next_short_circuits() {
        let log = Log::default();
        let chain = Chain::new()
            .with(record("A", &log))
            .with(from_fn(|_, res, _| {
                res.set_status(StatusCode::UNAUTHORIZED).text("no");
                Ok(())
            }))
            .with(record("C", &log));
        let terminal = |_: &mut Request, _: &mut Response, _: Option<&AppContext>| -> HandlerResult {
            panic!("handler must not run")
        };

        let mut res = Response::new();
        chain.execute(&mut request(), &mut res, &terminal).unwrap();

        assert_eq!(*log.lock().unwrap(), ["A:before", "A:after"]);
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.body(), b"no");
    }

    #[test]
    fn empty_chain_calls_terminal_directly() {
        let chain = Chain::new();
        let terminal = |_: &mut Request, res: &mut Response, app: Option<&AppContext>| -> HandlerResult {
            assert!(app.is_none());
            res.set_status(StatusCode::NO_CONTENT);
            Ok(())
        };
        let mut res = Response::new();
        chain.execute(&mut request(), &mut res, &terminal).unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert!(res.headers().is_empty());
    }

    #[test]
    fn second_next_after_handler_is_rejected() {
        let calls = Arc::new(Mutex::new(0));
        let chain = Chain::new().with(from_fn(|req, res, cx| {
            cx.next(req, res)?;
            cx.next(req, res)
        }));
        let counter = Arc::clone(&calls);
        let terminal = move |_: &mut Request, _: &mut Response, _: Option<&AppContext>| -> HandlerResult {
            *counter.lock().unwrap() += 1;
            Ok(())
        };

        let err = chain.execute(&mut request(), &mut Response::new(), &terminal).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NextCalledTwice)));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn second_next_after_downstream_short_circuit_is_rejected() {
        let log = Log::default();
        let chain = Chain::new()
            .with(from_fn(|req, res, cx| {
                cx.next(req, res)?;
                cx.next(req, res)
            }))
            .with(from_fn(|_, _, _| Ok(())))
            .with(record("C", &log));
        let terminal = |_: &mut Request, _: &mut Response, _: Option<&AppContext>| -> HandlerResult { Ok(()) };

        let err = chain.execute(&mut request(), &mut Response::new(), &terminal).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NextCalledTwice)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn errors_propagate_unchanged() {
        let log = Log::default();
        let chain = Chain::new().with(record("A", &log));
        let terminal = |_: &mut Request, _: &mut Response, _: Option<&AppContext>| -> HandlerResult {
            Err("database down".into())
        };
        let err = chain.execute(&mut request(), &mut Response::new(), &terminal).unwrap_err();
        assert_eq!(err.to_string(), "database down");
        assert_eq!(*log.lock().unwrap(), ["A:before"]);
    }

    #[test]
    fn app_context_reaches_units_and_terminal() {
        let app: AppContext = Arc::new(7u32);
        let chain = Chain::new().with(from_fn(|req, res, cx| {
            let seen = cx.app_context().and_then(|app| app.downcast_ref::<u32>()).copied();
            assert_eq!(seen, Some(7));
            assert_eq!(cx.position(), 1);
            cx.next(req, res)
        }));
        let terminal = |_: &mut Request, res: &mut Response, app: Option<&AppContext>| -> HandlerResult {
            let value = app.and_then(|app| app.downcast_ref::<u32>()).copied().unwrap_or(0);
            res.text(value.to_string());
            Ok(())
        };

        let mut res = Response::new();
        chain.execute_with_context(&mut request(), &mut res, &terminal, &app).unwrap();
        assert_eq!(res.body(), b"7");
    }
}
