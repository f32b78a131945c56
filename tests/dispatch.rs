//! End-to-end dispatch through the public API: routing, middleware ordering,
//! short-circuits, groups and error propagation.

use std::sync::{Arc, Mutex};

use pathwise::http::{Method, StatusCode};
use pathwise::middleware::{Chain, Context, Middleware, from_fn};
use pathwise::middleware::{auth::BearerAuth, cors::Cors, recover::Recover};
use pathwise::{Error, Group, HandlerResult, Request, Response, Router};

type Log = Arc<Mutex<Vec<String>>>;

/// Logs "<name>:before" and "<name>:after" around the rest of the chain.
struct Around {
    name: &'static str,
    log: Log,
}

impl Middleware for Around {
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        let result = cx.next(req, res);
        self.log.lock().unwrap().push(format!("{}:after", self.name));
        result
    }
}

fn around(name: &'static str, log: &Log) -> Around {
    Around { name, log: Arc::clone(log) }
}

fn get(router: &Router, target: &str) -> Result<Response, Error> {
    let mut res = Response::new();
    router.handle(&mut Request::new(Method::GET, target), &mut res)?;
    Ok(res)
}

fn show_id(req: &mut Request, res: &mut Response) -> HandlerResult {
    res.text(req.param("id").unwrap_or("-").to_owned());
    Ok(())
}

#[test]
fn global_chain_nests_around_handler() {
    let log = Log::default();
    let handler_log = Arc::clone(&log);
    let router = Router::new()
        .middleware(around("A", &log))
        .middleware(around("B", &log))
        .get("/", move |_, res| {
            handler_log.lock().unwrap().push("H".to_owned());
            res.text("ok");
            Ok(())
        });

    let res = get(&router, "/").unwrap();
    assert_eq!(res.body(), b"ok");
    assert_eq!(*log.lock().unwrap(), ["A:before", "B:before", "H", "B:after", "A:after"]);
}

#[test]
fn lookup_is_deterministic() {
    let router = Router::new()
        .get("/users/:id([0-9]+)", show_id)
        .get("/users/:name", show_id);

    let first = router.lookup(&Method::GET, "/users/42").unwrap();
    for _ in 0..10 {
        let again = router.lookup(&Method::GET, "/users/42").unwrap();
        assert_eq!(again.route.path(), first.route.path());
        assert_eq!(again.params, first.params);
    }
}

#[test]
fn constrained_and_unconstrained_params() {
    let router = Router::new()
        .get("/users/:id([0-9]+)", show_id)
        .get("/tags/:id", show_id);

    assert_eq!(get(&router, "/users/42").unwrap().body(), b"42");
    assert!(get(&router, "/users/abc").unwrap_err().is_not_found());
    assert_eq!(get(&router, "/tags/rust-lang").unwrap().body(), b"rust-lang");
    assert!(get(&router, "/tags/a/b").unwrap_err().is_not_found());
}

#[test]
fn explicit_catch_all_pattern_still_needs_matching_segment_count() {
    let router = Router::new().get("/files/:name(.*)", show_id);
    assert!(router.lookup(&Method::GET, "/files/report.pdf").is_some());
    assert!(router.lookup(&Method::GET, "/files/2024/report.pdf").is_none());
}

#[test]
fn auth_group_short_circuits_without_touching_global_chain() {
    let log = Log::default();
    let admin = Group::new()
        .get("/stats", |_, res| {
            res.text("secret");
            Ok(())
        })
        .middleware(BearerAuth::new(|token| token == "t0ken"));

    let router = Router::new()
        .middleware(around("global", &log))
        .get("/public", |_, res| {
            res.text("hello");
            Ok(())
        })
        .mount("/admin", admin);

    let res = get(&router, "/admin/stats").unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.body(), b"unauthorized");

    let mut req = Request::new(Method::GET, "/admin/stats").with_header("Authorization", "Bearer t0ken");
    let mut res = Response::new();
    router.handle(&mut req, &mut res).unwrap();
    assert_eq!(res.body(), b"secret");

    assert!(log.lock().unwrap().is_empty());
    get(&router, "/public").unwrap();
    assert_eq!(*log.lock().unwrap(), ["global:before", "global:after"]);
}

#[test]
fn recover_translates_errors_only_when_registered() {
    let failing = |_: &mut Request, _: &mut Response| -> HandlerResult { Err("db unavailable".into()) };

    let bare = Router::new().get("/", failing);
    let err = get(&bare, "/").unwrap_err();
    assert!(matches!(err, Error::Handler(_)));

    let guarded = Router::new().middleware(Recover).get("/", failing);
    let res = get(&guarded, "/").unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn cors_preflight_needs_an_options_route() {
    let router = Router::new()
        .middleware(Cors::permissive())
        .get("/items", show_id)
        .options("/items", |_, _| Ok(()));

    let mut req = Request::new(Method::OPTIONS, "/items").with_header("access-control-request-method", "GET");
    let mut res = Response::new();
    router.handle(&mut req, &mut res).unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(res.header("access-control-allow-origin"), Some("*"));

    let mut req = Request::new(Method::OPTIONS, "/other").with_header("access-control-request-method", "GET");
    let err = router.handle(&mut req, &mut Response::new()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn middleware_can_enrich_request_for_handler() {
    #[derive(Clone)]
    struct RequestId(u32);

    let router = Router::new()
        .middleware(from_fn(|req, res, cx| {
            req.extensions_mut().insert(RequestId(17));
            cx.next(req, res)?;
            res.set_header("x-request-id", "17");
            Ok(())
        }))
        .get("/", |req, res| {
            let id = req.extensions().get::<RequestId>().map_or(0, |id| id.0);
            res.text(id.to_string());
            Ok(())
        });

    let res = get(&router, "/").unwrap();
    assert_eq!(res.body(), b"17");
    assert_eq!(res.header("x-request-id"), Some("17"));
}

#[test]
fn route_level_chain_from_add_route_with_middleware() {
    let log = Log::default();
    let mut router = Router::new().middleware(around("global", &log));
    router
        .add_route_with_middleware(Method::GET, "/only", show_id, Chain::new().with(around("route", &log)))
        .unwrap();

    assert!(router.add_route(Method::GET, "/broken/:id(", show_id).is_err());
    assert_eq!(router.len(), 1);

    get(&router, "/only").unwrap();
    assert_eq!(*log.lock().unwrap(), ["route:before", "route:after"]);
}
