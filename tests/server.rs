//! Serves a router over a real socket and talks raw HTTP/1.1 to it.

use pathwise::http::StatusCode;
use pathwise::middleware::recover::Recover;
use pathwise::{Router, serve_listener};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn send(addr: std::net::SocketAddr, head: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8(raw).unwrap()
}

#[tokio::test]
async fn routes_requests_end_to_end() {
    let router = Router::new()
        .middleware(Recover)
        .get("/users/:id([0-9]+)", |req, res| {
            let id = req.param("id").unwrap_or_default().to_owned();
            res.text(format!("user {id}"));
            Ok(())
        })
        .post("/echo", |req, res| {
            let body = String::from_utf8_lossy(req.body()).into_owned();
            res.set_status(StatusCode::CREATED).text(body);
            Ok(())
        })
        .get("/boom", |_, _| Err("exploded".into()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_listener(listener, router, async move {
        let _ = stopped.await;
    }));

    let reply = send(addr, "GET /users/7?x=1 HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.1 200"), "{reply}");
    assert!(reply.ends_with("user 7"), "{reply}");

    let reply = send(addr, "GET /users/x HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.1 404"), "{reply}");

    let reply = send(
        addr,
        "POST /echo HTTP/1.1\r\nhost: test\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello",
    )
    .await;
    assert!(reply.starts_with("HTTP/1.1 201"), "{reply}");
    assert!(reply.ends_with("hello"), "{reply}");

    let reply = send(addr, "GET /boom HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.1 500"), "{reply}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
