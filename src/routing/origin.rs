//! Outbound origin exchange.
//!
//! # Responsibilities
//! - Resolve and connect to the origin for every request
//! - Run a single HTTP/1.1 exchange over that connection
//! - Buffer the full response for caching
//!
//! # Design Decisions
//! - No pooling: each request gets a fresh connection that is dropped after
//!   the response body has been read
//! - Connect failures and exchange failures are distinct, because the client
//!   sees a different status for each

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper::Request;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpStream;

use crate::cache::StoredResponse;
use crate::routing::target::OriginTarget;

/// Error type for origin operations.
#[derive(Debug, Error)]
pub enum OriginError {
    /// Name resolution or TCP connect failed.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The connection was established but the HTTP exchange failed.
    #[error("origin exchange failed: {0}")]
    Exchange(#[from] hyper::Error),
}

/// Dials origins and performs one request per connection.
#[derive(Debug, Clone)]
pub struct OriginClient {
    default_port: u16,
}

impl OriginClient {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }

    /// Open a new connection to the target's origin.
    pub async fn connect(&self, target: &OriginTarget) -> Result<TcpStream, OriginError> {
        let (host, port) = target.connect_addr(self.default_port);
        TcpStream::connect((host, port))
            .await
            .map_err(|source| OriginError::Connect {
                host: host.to_string(),
                port,
                source,
            })
    }

    /// Send `request` over `stream` and read the whole response.
    pub async fn exchange(
        &self,
        stream: TcpStream,
        request: Request<Full<Bytes>>,
    ) -> Result<StoredResponse, OriginError> {
        let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Origin connection closed with error");
            }
        });

        let response = sender.send_request(request).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();

        Ok(StoredResponse {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
        })
    }
}
