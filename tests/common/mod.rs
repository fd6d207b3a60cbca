//! Shared utilities for integration tests: a programmable raw-TCP origin and
//! a proxy harness bound to an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use caching_proxy::cache::CacheStore;
use caching_proxy::config::ProxyConfig;
use caching_proxy::net::{Listener, ListenerError};
use caching_proxy::{ProxyServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A request as the origin saw it on the wire.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The request target from the request line.
    pub fn target(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or("")
    }
}

/// What the origin answers.
#[derive(Debug, Clone)]
pub struct OriginReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl OriginReply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn not_modified() -> Self {
        Self {
            status: 304,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn etag(mut self, etag: &str) -> Self {
        self.headers.push(("ETag".to_string(), etag.to_string()));
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let reason = match self.status {
            200 => "OK",
            304 => "Not Modified",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        };
        let mut out = format!("HTTP/1.1 {} {}\r\n", self.status, reason);
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        if self.status != 304 {
            out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        out.push_str("Connection: close\r\n\r\n");
        if self.status != 304 {
            out.push_str(&self.body);
        }
        out.into_bytes()
    }
}

/// A running mock origin.
pub struct MockOrigin {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockOrigin {
    pub fn requests(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start an origin that answers every request with `handler`'s reply.
pub async fn start_origin<F>(handler: F) -> MockOrigin
where
    F: Fn(&ReceivedRequest) -> OriginReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let log = Arc::clone(&received);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let reply = handler(&request);
                log.lock().unwrap().push(request);
                let _ = socket.write_all(&reply.to_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockOrigin { addr, received }
}

/// Start an origin that accepts connections and closes them without answering.
pub async fn start_hangup_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = read_request(&mut socket).await;
            drop(socket);
        }
    });
    addr
}

/// An address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<ReceivedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(ReceivedRequest {
        request_line,
        headers,
        body,
    })
}

/// A proxy running on an ephemeral port with its own state directory.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub state_dir: PathBuf,
    pub cache: Arc<CacheStore>,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), ListenerError>>,
}

/// A fresh, empty state directory for one test.
pub fn fresh_state_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("caching-proxy-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

impl TestProxy {
    /// Start a proxy over a fresh state directory.
    pub async fn start(name: &str, configure: impl FnOnce(&mut ProxyConfig)) -> Self {
        Self::start_in(&fresh_state_dir(name), configure).await
    }

    /// Start a proxy over an existing state directory.
    pub async fn start_in(state_dir: &Path, configure: impl FnOnce(&mut ProxyConfig)) -> Self {
        let mut config = ProxyConfig::default();
        config.storage.state_dir = state_dir.to_path_buf();
        config.listener.bind_address = "127.0.0.1:0".to_string();
        configure(&mut config);

        let server = ProxyServer::new(&config).await.unwrap();
        let cache = Arc::clone(server.cache());
        let listener = Listener::bind(&config.listener).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

        Self {
            addr,
            state_dir: state_dir.to_path_buf(),
            cache,
            shutdown,
            task,
        }
    }

    /// A client that sends every request through this proxy.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .proxy(reqwest::Proxy::http(format!("http://{}", self.addr)).unwrap())
            .build()
            .unwrap()
    }

    pub fn journal(&self) -> String {
        std::fs::read_to_string(self.state_dir.join("log.txt")).unwrap()
    }

    pub fn journal_lines(&self) -> Vec<String> {
        self.journal().lines().map(str::to_string).collect()
    }

    /// Trigger shutdown and wait for the final snapshot.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.task.await.unwrap().unwrap();
    }
}
