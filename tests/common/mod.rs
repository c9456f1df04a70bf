//! Shared utilities for integration testing.
//!
//! Mock upstreams speak raw HTTP/1.1 over TCP so tests control exactly
//! when bytes reach the proxy.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use prefix_proxy::config::{ProxyConfig, RouteConfig};
use prefix_proxy::net::RelayTracker;
use prefix_proxy::{HttpServer, Shutdown};

/// A request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub head: String,
    pub body: Vec<u8>,
}

impl Captured {
    /// The request line, e.g. `GET /health HTTP/1.1`.
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// All values of header `name`, in order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.head
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .filter(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim().to_string())
            .collect()
    }
}

/// Read one request (head plus Content-Length body) from `socket`.
pub async fn read_request(socket: &mut TcpStream) -> Option<Captured> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let captured = Captured {
        head,
        body: Vec::new(),
    };
    let length: usize = captured
        .header_values("content-length")
        .first()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[head_end..].to_vec();
    while body.len() < length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Captured { body, ..captured })
}

/// Bind an ephemeral port on localhost.
pub async fn bind_local() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let (listener, addr) = bind_local().await;
    drop(listener);
    addr
}

pub fn origin(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// Upstream that answers every request with `response` verbatim and
/// reports what it received.
pub async fn start_fixed_upstream(
    response: &'static str,
) -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    let (listener, addr) = bind_local().await;
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(captured) = read_request(&mut socket).await {
                    let _ = tx.send(captured);
                    if socket.write_all(response.as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (addr, rx)
}

/// Upstream returning `200` with `body` and `Content-Length`.
pub async fn start_text_upstream(body: &'static str) -> SocketAddr {
    let response: &'static str = Box::leak(
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\r\n{}",
            body.len(),
            body
        )
        .into_boxed_str(),
    );
    start_fixed_upstream(response).await.0
}

/// Upstream that accepts connections, reads the request and never answers.
/// The returned counter is the number of connections accepted.
pub async fn start_silent_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let (listener, addr) = bind_local().await;
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
                drop(socket);
            });
        }
    });

    (addr, accepted)
}

/// Upstream that reads the request and then holds the socket without
/// answering until the proxy closes it. The counter holds the number of
/// sockets still open.
pub async fn start_holding_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let (listener, addr) = bind_local().await;
    let open = Arc::new(AtomicUsize::new(0));
    let counter = open.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_some() {
                    let mut buf = [0u8; 1024];
                    while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                }
                counter.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    (addr, open)
}

/// Upstream that reads each request and closes the connection without a
/// response. The counter is the number of connections accepted.
pub async fn start_hangup_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let (listener, addr) = bind_local().await;
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                drop(socket);
            });
        }
    });

    (addr, accepted)
}

const CHUNKED_HEAD: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\n\r\n";

fn chunk(data: &str) -> String {
    format!("{:x}\r\n{}\r\n", data.len(), data)
}

/// Upstream that sends `first`, waits for `gate`, then sends `second` and
/// ends the chunked body.
pub async fn start_gated_stream_upstream(
    first: &'static str,
    second: &'static str,
    gate: oneshot::Receiver<()>,
) -> SocketAddr {
    let (listener, addr) = bind_local().await;

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let _ = read_request(&mut socket).await;
        let _ = socket.write_all(CHUNKED_HEAD.as_bytes()).await;
        let _ = socket.write_all(chunk(first).as_bytes()).await;
        let _ = socket.flush().await;

        let _ = gate.await;
        let _ = socket.write_all(chunk(second).as_bytes()).await;
        let _ = socket.write_all(b"0\r\n\r\n").await;
        let _ = socket.flush().await;
    });

    addr
}

/// Upstream that streams a chunk every 50ms until the peer goes away.
/// The counter holds the number of currently open upstream connections.
pub async fn start_endless_stream_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let (listener, addr) = bind_local().await;
    let open = Arc::new(AtomicUsize::new(0));
    let counter = open.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                if socket.write_all(CHUNKED_HEAD.as_bytes()).await.is_ok() {
                    let mut tick = 0u64;
                    loop {
                        let data = format!("tick {tick}\n");
                        if socket.write_all(chunk(&data).as_bytes()).await.is_err() {
                            break;
                        }
                        tick += 1;
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
                counter.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    (addr, open)
}

/// Upstream that sends headers and part of the body, then `then` happens:
/// either the connection closes or it stalls forever.
pub enum AfterPartial {
    Close,
    Stall,
}

pub async fn start_partial_upstream(after: AfterPartial) -> SocketAddr {
    let (listener, addr) = bind_local().await;

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let stall = matches!(after, AfterPartial::Stall);
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                    .await;
                let _ = socket.flush().await;
                if stall {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                drop(socket);
            });
        }
    });

    addr
}

/// A running proxy on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub tracker: RelayTracker,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let (listener, addr) = bind_local().await;
    let server = HttpServer::new(config).expect("valid test config");
    let tracker = server.tracker();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy {
        addr,
        shutdown,
        tracker,
    }
}

/// Config with just the given routes and otherwise default settings.
pub fn config_with(routes: Vec<RouteConfig>) -> ProxyConfig {
    ProxyConfig {
        routes,
        ..ProxyConfig::default()
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
