//! Pattern request router.
//!
//! Routes live in one list, in registration order. A lookup walks that list
//! and returns the first route whose method, segment count and segments all
//! match: first match wins, there is no specificity ranking. Register
//! `/users/me` before `/users/:id` if you want it to win.
//!
//! Parameter-free routes are also indexed by their full path, so a purely
//! static request skips the walk when no earlier parameterized route could
//! have claimed it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use tracing::{debug, warn};

use crate::constraint::{self, ConstraintMatcher, RegexMatcher};
use crate::error::Error;
use crate::handler::{self, AppContext, BoxedHandler, HandlerResult};
use crate::middleware::{Chain, Middleware};
use crate::pattern::{self, PathSegment};
use crate::request::{Params, Request};
use crate::response::Response;

// ── Route ─────────────────────────────────────────────────────────────────────

/// One registered route. Immutable once registered.
pub struct Route {
    method: Method,
    path: String,
    segments: Vec<PathSegment>,
    handler: BoxedHandler,
    chain: Option<Chain>,
}

impl Route {
    pub fn method(&self) -> &Method { &self.method }

    /// The template as registered, prefix included for mounted routes.
    pub fn path(&self) -> &str { &self.path }

    pub fn segments(&self) -> &[PathSegment] { &self.segments }

    /// `true` when the route carries its own chain instead of the global one.
    pub fn has_middleware(&self) -> bool { self.chain.is_some() }

    fn is_static(&self) -> bool {
        self.segments.iter().all(PathSegment::is_static)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("segments", &self.segments)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

/// A successful lookup: the route and the parameters bound on the way.
#[derive(Debug)]
pub struct Match<'r> {
    pub route: &'r Route,
    pub params: Params,
}

// ── Group ─────────────────────────────────────────────────────────────────────

/// Routes registered together under a prefix with [`Router::mount`].
///
/// A group may carry its own chain; every mounted route then runs that chain
/// instead of the router's global one.
///
/// ```rust
/// use pathwise::{Group, HandlerResult, Request, Response, Router};
/// use pathwise::middleware::trace::Trace;
///
/// fn list(_: &mut Request, res: &mut Response) -> HandlerResult { res.text("[]"); Ok(()) }
/// fn show(req: &mut Request, res: &mut Response) -> HandlerResult {
///     res.text(req.param("id").unwrap_or_default().to_owned());
///     Ok(())
/// }
///
/// let api = Group::new()
///     .get("/books", list)
///     .get("/books/:id([0-9]+)", show)
///     .middleware(Trace);
/// let router = Router::new().mount("/api/v1", api);
/// assert_eq!(router.routes().next().unwrap().path(), "/api/v1/books");
/// ```
#[derive(Default)]
pub struct Group {
    routes: Vec<(Method, String, BoxedHandler)>,
    chain: Option<Chain>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<H>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.routes.push((method, path.to_owned(), handler::boxed(handler)));
        self
    }

    pub fn get<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::GET, path, handler)
    }

    pub fn post<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::POST, path, handler)
    }

    pub fn put<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::DELETE, path, handler)
    }

    /// Appends a unit to the group's own chain, creating it on first use.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.chain.get_or_insert_with(Chain::new).push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// First static route registered for a canonical path.
struct StaticEntry {
    index: usize,
    // A parameterized route with the same method and segment count was
    // registered earlier and may claim the path first.
    shadowed: bool,
}

/// The application router.
///
/// Build it once at startup, then share it read-only (the server wraps it in
/// an `Arc`). The chaining methods ([`on`](Router::on), [`get`](Router::get),
/// [`mount`](Router::mount), ...) panic on a malformed path template, like
/// any other startup misconfiguration; the `add_*` / `try_mount` methods
/// return the error instead.
///
/// ```rust
/// use pathwise::{HandlerResult, Request, Response, Router};
/// use pathwise::http::Method;
///
/// fn get_user(req: &mut Request, res: &mut Response) -> HandlerResult {
///     res.text(format!("user {}", req.param("id").unwrap_or("?")));
///     Ok(())
/// }
///
/// let router = Router::new().get("/users/:id([0-9]+)", get_user);
///
/// let mut req = Request::new(Method::GET, "/users/42");
/// let mut res = Response::new();
/// router.handle(&mut req, &mut res).unwrap();
/// assert_eq!(res.body(), b"user 42");
/// ```
pub struct Router {
    routes: Vec<Route>,
    statics: HashMap<Method, HashMap<String, StaticEntry>>,
    global: Chain,
    matcher: Arc<dyn ConstraintMatcher>,
    app: Option<AppContext>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            statics: HashMap::new(),
            global: Chain::new(),
            matcher: Arc::new(RegexMatcher::new()),
            app: None,
        }
    }

    // ── Builder-style registration ───────────────────────────────────────────

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template.
    pub fn on<H>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(method, path, handler)
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }

    pub fn get<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::GET, path, handler)
    }

    pub fn post<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::POST, path, handler)
    }

    pub fn put<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::PUT, path, handler)
    }

    pub fn patch<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::PATCH, path, handler)
    }

    pub fn delete<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::DELETE, path, handler)
    }

    pub fn options<H>(self, path: &str, handler: H) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::OPTIONS, path, handler)
    }

    /// Like [`on`](Router::on), but the route runs `chain` instead of the
    /// global middleware.
    pub fn on_with<H>(mut self, method: Method, path: &str, handler: H, chain: Chain) -> Self
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route_with_middleware(method, path, handler, chain)
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }

    /// Registers every route of `group` under `prefix`.
    ///
    /// # Panics
    ///
    /// Panics if any prefixed template is invalid; nothing is registered then.
    pub fn mount(mut self, prefix: &str, group: Group) -> Self {
        self.try_mount(prefix, group)
            .unwrap_or_else(|e| panic!("{e}"));
        self
    }

    /// Appends a unit to the global chain.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.global.push(middleware);
        self
    }

    /// Sets the application context handed to every handler
    /// (read it with [`Request::app`]).
    pub fn state<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.app = Some(Arc::new(value));
        self
    }

    /// Replaces the constraint matcher (a [`RegexMatcher`] by default).
    pub fn matcher(mut self, matcher: impl ConstraintMatcher) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    // ── Fallible registration ────────────────────────────────────────────────

    /// Registers a route. On an invalid template nothing is added.
    pub fn add_route<H>(&mut self, method: Method, path: &str, handler: H) -> Result<(), Error>
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        let segments = pattern::compile(path)?;
        self.push(method, path.to_owned(), segments, handler::boxed(handler), None);
        Ok(())
    }

    /// Registers a route that runs `chain` instead of the global middleware.
    pub fn add_route_with_middleware<H>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        chain: Chain,
    ) -> Result<(), Error>
    where
        H: Fn(&mut Request, &mut Response) -> HandlerResult + Send + Sync + 'static,
    {
        let segments = pattern::compile(path)?;
        self.push(method, path.to_owned(), segments, handler::boxed(handler), Some(chain));
        Ok(())
    }

    /// Registers every route of `group` under `prefix`, all or nothing.
    pub fn try_mount(&mut self, prefix: &str, group: Group) -> Result<(), Error> {
        let compiled = group.routes.into_iter()
            .map(|(method, path, handler)| {
                let path = join(prefix, &path);
                let segments = pattern::compile(&path)?;
                Ok((method, path, segments, handler))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        debug!(prefix, routes = compiled.len(), "mounting route group");
        for (method, path, segments, handler) in compiled {
            self.push(method, path, segments, handler, group.chain.clone());
        }
        Ok(())
    }

    fn push(
        &mut self,
        method: Method,
        path: String,
        segments: Vec<PathSegment>,
        handler: BoxedHandler,
        chain: Option<Chain>,
    ) {
        for segment in &segments {
            if let PathSegment::Param { pattern: Some(pattern), .. } = segment {
                if let Err(e) = self.matcher.is_match(&constraint::anchor(pattern), "") {
                    warn!(path = %path, error = %e, "constraint will use the fallback classifier");
                }
            }
        }

        if segments.iter().all(PathSegment::is_static) {
            let shadowed = self.routes.iter().any(|r| {
                r.method == method && r.segments.len() == segments.len() && !r.is_static()
            });
            let key = canonical(segments.iter().filter_map(|s| match s {
                PathSegment::Static(literal) => Some(literal.as_str()),
                PathSegment::Param { .. } => None,
            }));
            self.statics
                .entry(method.clone())
                .or_default()
                .entry(key)
                .or_insert(StaticEntry { index: self.routes.len(), shadowed });
        }

        debug!(method = %method, path = %path, middleware = chain.as_ref().map_or(0, Chain::len), "route registered");
        self.routes.push(Route { method, path, segments, handler, chain });
    }

    // ── Introspection ────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in registration order, which is also lookup order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn global_middleware(&self) -> &Chain {
        &self.global
    }

    // ── Matching ─────────────────────────────────────────────────────────────

    /// Finds the first route matching `method` and `path`.
    ///
    /// Any `?query` suffix is ignored. Segment counts must be equal: `/users/:id`
    /// never matches `/users/1/2`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<Match<'_>> {
        let path = path.split_once('?').map_or(path, |(path, _)| path);
        let segments: Vec<&str> = pattern::split(path).collect();

        if let Some(route) = self.static_hit(method, &segments) {
            return Some(Match { route, params: Params::new() });
        }

        self.routes.iter()
            .filter(|route| route.method == *method && route.segments.len() == segments.len())
            .find_map(|route| {
                self.bind(route, &segments).map(|params| Match { route, params })
            })
    }

    fn static_hit(&self, method: &Method, segments: &[&str]) -> Option<&Route> {
        let entry = self.statics.get(method)?.get(&canonical(segments.iter().copied()))?;
        (!entry.shadowed).then(|| &self.routes[entry.index])
    }

    fn bind(&self, route: &Route, segments: &[&str]) -> Option<Params> {
        let mut params = Params::new();
        for (compiled, &actual) in route.segments.iter().zip(segments) {
            match compiled {
                PathSegment::Static(literal) => {
                    if literal != actual {
                        return None;
                    }
                }
                PathSegment::Param { name, pattern } => {
                    if let Some(pattern) = pattern {
                        if !self.satisfies(pattern, actual) {
                            return None;
                        }
                    }
                    params.insert(name.clone(), actual.to_owned());
                }
            }
        }
        Some(params)
    }

    fn satisfies(&self, pattern: &str, value: &str) -> bool {
        let anchored = constraint::anchor(pattern);
        match self.matcher.is_match(&anchored, value) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(error = %e, "constraint evaluation failed, using fallback classifier");
                constraint::fallback(&anchored, value)
            }
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Routes one request and runs it through its chain.
    ///
    /// The matched route's own chain runs if it has one, the global chain
    /// otherwise; the two are never combined. Returns
    /// [`Error::RouteNotFound`] when nothing matches, and
    /// [`Error::Handler`] when an error escapes the chain.
    pub fn handle(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        let Some(Match { route, params }) = self.lookup(req.method(), req.path()) else {
            debug!(method = %req.method(), path = req.path(), "no route matched");
            return Err(Error::RouteNotFound {
                method: req.method().clone(),
                path: req.path().to_owned(),
            });
        };

        debug!(method = %route.method, route = %route.path, "route matched");
        req.params = params;

        let chain = route.chain.as_ref().unwrap_or(&self.global);
        let terminal = |req: &mut Request, res: &mut Response, app: Option<&AppContext>| {
            req.app = app.cloned();
            (route.handler)(req, res)
        };

        let result = match &self.app {
            Some(app) => chain.execute_with_context(req, res, &terminal, app),
            None => chain.execute(req, res, &terminal),
        };
        result.map_err(Error::Handler)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Prefixes a group route's template. Empty segments vanish at compile time,
/// so doubled slashes at the seam are harmless.
fn join(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// `/`-joined form used as the static index key. The root is `/`.
fn canonical<'s>(segments: impl Iterator<Item = &'s str>) -> String {
    let mut key = String::new();
    for segment in segments {
        key.push('/');
        key.push_str(segment);
    }
    if key.is_empty() {
        key.push('/');
    }
    key
}
