//! HTTP server adapter.
//!
//! The dispatch core never touches a socket. This module is the thin
//! collaborator that does: it accepts connections, lets hyper parse each
//! request (HTTP/1.1 or HTTP/2, whatever the client negotiates), buffers the
//! body, and hands a [`Request`] to [`Router::handle`] on a blocking worker.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns from [`Server::serve`]. Orchestrators
//! send SIGTERM and wait a grace period before SIGKILL; keep that period
//! longer than your slowest request.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use pathwise::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    pub fn from_addr(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections and returns.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `shutdown` resolves.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve_listener(listener, router, shutdown).await
    }
}

/// Accept loop over an already-bound listener.
///
/// Useful when the caller needs the bound address first, e.g. port `0` in
/// tests.
pub async fn serve_listener(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Error> {
    let router = Arc::new(router);
    info!(addr = %listener.local_addr()?, routes = router.len(), "pathwise listening");

    let mut tasks = tokio::task::JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Shutdown first: once signalled, queued connections are not accepted.
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let router = Arc::clone(&router);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    let svc = service_fn(move |req| dispatch(Arc::clone(&router), req, remote_addr));
                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        warn!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connections so the set stays small.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}

    info!("pathwise stopped");
    Ok(())
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: routes one request and produces one response.
///
/// The chain is synchronous, so it runs on tokio's blocking pool: a handler
/// that blocks holds one worker thread, never the reactor.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes a 400, 404 or 500 here, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let request = match into_request(req).await {
        Ok(request) => request,
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(status_only(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let response = tokio::task::spawn_blocking(move || respond(&router, request))
        .await
        .unwrap_or_else(|e| {
            error!(peer = %remote_addr, "dispatch worker failed: {e}");
            status_only(StatusCode::INTERNAL_SERVER_ERROR)
        });

    Ok(response.into_inner())
}

/// Buffers the body and copies the head into a [`Request`]. Header values
/// that are not visible ASCII are dropped.
async fn into_request(req: hyper::Request<hyper::body::Incoming>) -> Result<Request, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let mut request = Request::new(parts.method.clone(), target).with_body(body);
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    Ok(request)
}

/// Runs the router and maps dispatch errors onto status codes.
fn respond(router: &Router, mut req: Request) -> Response {
    let mut res = Response::new();
    match router.handle(&mut req, &mut res) {
        Ok(()) => res,
        Err(e) if e.is_not_found() => status_only(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(method = %req.method(), path = req.path(), "unhandled error: {e}");
            status_only(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn status_only(status: StatusCode) -> Response {
    let mut res = Response::new();
    res.set_status(status);
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM or SIGINT (Ctrl-C); Ctrl-C only on non-Unix targets.
///
/// If a handler cannot be installed that signal is logged and ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
