//! Per-connection session handling.
//!
//! # Responsibilities
//! - Speak HTTP/1.1 with keep-alive on one client connection
//! - Hand each request to the proxy router, strictly one at a time
//! - Finish the in-flight request on client EOF, then end quietly
//! - Log and abort on any other I/O failure
//!
//! # Design Decisions
//! - Message framing is delegated to hyper's HTTP/1 server connection
//! - Requests on a connection are never processed concurrently
//! - A transport failure drops the connection without a response

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::Request;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpStream;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::net::connection::ConnectionGuard;
use crate::routing::ProxyRouter;

/// Serve one client connection until it closes or fails.
pub async fn serve_session(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<ProxyRouter>,
    guard: ConnectionGuard,
) {
    let connection_id = guard.id();
    tracing::debug!(connection_id = %connection_id, peer = %peer, "Session started");

    let service = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .service_fn(move |request: Request<Incoming>| {
            let router = Arc::clone(&router);
            async move { router.handle(request).await }
        });

    // A client may shut down its write side right after a request; the
    // response is still owed.
    let result = http1::Builder::new()
        .keep_alive(true)
        .half_close(true)
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service))
        .await;

    match result {
        Ok(()) => {
            tracing::debug!(connection_id = %connection_id, peer = %peer, "Session closed by client");
        }
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, peer = %peer, error = %e, "Session aborted");
        }
    }

    drop(guard);
}
