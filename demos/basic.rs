//! Minimal pathwise example: CRUD-style JSON endpoints, a protected admin
//! group and health checks.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/abc          # 404: id must be numeric
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:3000/users/42
//!   curl -H 'authorization: Bearer letmein' http://localhost:3000/admin/stats
//!   curl http://localhost:3000/healthz

use std::sync::atomic::{AtomicU64, Ordering};

use pathwise::http::StatusCode;
use pathwise::middleware::{auth::BearerAuth, cors::Cors, recover::Recover, trace::Trace};
use pathwise::{Group, HandlerResult, Request, Response, Router, Server, health};

struct Stats {
    created: AtomicU64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let admin = Group::new()
        .get("/stats", stats)
        .middleware(Trace)
        .middleware(BearerAuth::new(|token| token == "letmein").realm("admin"));

    let app = Router::new()
        .state(Stats { created: AtomicU64::new(0) })
        .middleware(Trace)
        .middleware(Recover)
        .middleware(Cors::permissive())
        .get("/healthz",                health::liveness)
        .get("/readyz",                 health::readiness)
        .get("/users/:id([0-9]+)",      get_user)
        .post("/users",                 create_user)
        .delete("/users/:id([0-9]+)",   delete_user)
        .mount("/admin", admin);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /users/:id
fn get_user(req: &mut Request, res: &mut Response) -> HandlerResult {
    let id = req.param("id").unwrap_or("unknown");
    res.json(format!(r#"{{"id":{id},"name":"alice"}}"#).into_bytes());
    Ok(())
}

// POST /users
//
// req.body() is &[u8]: parse it with serde_json::from_slice or anything else.
fn create_user(req: &mut Request, res: &mut Response) -> HandlerResult {
    if req.body().is_empty() {
        res.set_status(StatusCode::BAD_REQUEST);
        return Ok(());
    }

    if let Some(stats) = req.app::<Stats>() {
        stats.created.fetch_add(1, Ordering::Relaxed);
    }
    res.set_status(StatusCode::CREATED)
        .set_header("location", "/users/99")
        .json(br#"{"id":99,"name":"new_user"}"#.to_vec());
    Ok(())
}

// DELETE /users/:id → 204 No Content
fn delete_user(_req: &mut Request, res: &mut Response) -> HandlerResult {
    res.set_status(StatusCode::NO_CONTENT);
    Ok(())
}

// GET /admin/stats, behind the group's bearer auth
fn stats(req: &mut Request, res: &mut Response) -> HandlerResult {
    let created = req.app::<Stats>().map_or(0, |s| s.created.load(Ordering::Relaxed));
    res.json(format!(r#"{{"created":{created}}}"#).into_bytes());
    Ok(())
}
