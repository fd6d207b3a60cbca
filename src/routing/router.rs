//! Per-request proxy decision and forwarding.
//!
//! # Flow
//! ```text
//! request
//!     → target extraction, trailing `/`
//!     → blacklist (any method)                  → 400 Banned host {host}
//!     → method check (GET/POST only)            → 400 Unknown HTTP-method
//!     → no usable host                          → 400 Invalid request target
//!     → connect to origin                       → 400 Failed to connect to host {host}
//!     → rewrite target, Host, If-None-Match
//!     → exchange                                → 502 on failure
//!     → 304: serve cached entry, journal "Cached: host 304"
//!       else: journal "host status", cache if ETag present
//!     → snapshot when the dirty counter reaches the threshold
//! ```

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderValue, HOST, IF_NONE_MATCH};
use hyper::{Method, Request, Response, StatusCode, Version};

use crate::cache::{CacheEntry, CacheStore};
use crate::error::{BoxError, ProxyError};
use crate::http::response::{bad_request, error_page};
use crate::journal::{Journal, JournalRecord};
use crate::observability::metrics;
use crate::routing::origin::OriginClient;
use crate::routing::target::OriginTarget;
use crate::security::Blacklist;

/// Shared proxy state consulted by every session.
#[derive(Debug)]
pub struct ProxyRouter {
    blacklist: Blacklist,
    cache: Arc<CacheStore>,
    journal: Arc<Journal>,
    origin: OriginClient,
    snapshot_threshold: u64,
}

impl ProxyRouter {
    pub fn new(
        blacklist: Blacklist,
        cache: Arc<CacheStore>,
        journal: Arc<Journal>,
        origin: OriginClient,
        snapshot_threshold: u64,
    ) -> Self {
        Self {
            blacklist,
            cache,
            journal,
            origin,
            snapshot_threshold,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Proxy one client request.
    ///
    /// Only a failure to read the client's request body is returned as an
    /// error; every other outcome is a response for the client.
    pub async fn handle<B>(&self, request: Request<B>) -> Result<Response<Full<Bytes>>, ProxyError>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let version = request.version();

        let target = OriginTarget::from_request(request.uri(), request.headers());

        if let Some(target) = &target {
            if self.blacklist.contains(&target.host) {
                tracing::info!(host = %target.host, "Blocked request to banned host");
                metrics::record_request("banned");
                return Ok(bad_request(version, &format!("Banned host {}", target.host)));
            }
        }

        if request.method() != Method::GET && request.method() != Method::POST {
            tracing::debug!(method = %request.method(), "Rejecting unsupported method");
            metrics::record_request("rejected_method");
            return Ok(bad_request(version, "Unknown HTTP-method"));
        }

        let target = match target {
            Some(target) => target,
            None => {
                tracing::debug!(uri = %request.uri(), "Request carries no origin host");
                metrics::record_request("rejected_target");
                return Ok(bad_request(version, "Invalid request target"));
            }
        };
        let (host_header, origin_uri) = match (target.host_header(), target.origin_form()) {
            (Some(host_header), Some(origin_uri)) => (host_header, origin_uri),
            _ => {
                tracing::debug!(host = %target.host, path = %target.path, "Target cannot be rewritten");
                metrics::record_request("rejected_target");
                return Ok(bad_request(version, "Invalid request target"));
            }
        };

        let key = target.cache_key();
        tracing::debug!(host = %target.host, key = %key, "Forwarding request");

        let (mut parts, body) = request.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ProxyError::RequestBody(e.into()))?
            .to_bytes();

        let stream = match self.origin.connect(&target).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(host = %target.host, error = %e, "Origin unreachable");
                metrics::record_request("connect_failed");
                return Ok(bad_request(
                    version,
                    &format!("Failed to connect to host {}", target.host),
                ));
            }
        };

        // Captured once: a 304 revalidates exactly this entry, even if another
        // session overwrites the key while the exchange is in flight.
        let cached = self.cache.lookup(&key);
        let validator = cached
            .as_ref()
            .and_then(|entry| HeaderValue::from_str(&entry.etag).ok())
            .unwrap_or_else(|| HeaderValue::from_static(""));

        parts.uri = origin_uri;
        parts.version = Version::HTTP_11;
        parts.headers.insert(HOST, host_header);
        parts.headers.insert(IF_NONE_MATCH, validator);

        let response = match self
            .origin
            .exchange(stream, Request::from_parts(parts, Full::new(body)))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(host = %target.host, error = %e, "Origin exchange failed");
                metrics::record_request("upstream_failed");
                return Ok(error_page(StatusCode::BAD_GATEWAY, version, "Upstream request failed"));
            }
        };

        let status = response.status;
        if status == StatusCode::NOT_MODIFIED {
            return Ok(match cached {
                Some(entry) => {
                    self.journal
                        .append(JournalRecord::cached(&target.host, status.as_u16()))
                        .await;
                    tracing::debug!(host = %target.host, key = %key, "Serving revalidated entry");
                    metrics::record_cache_hit();
                    metrics::record_request("cache_hit");
                    entry.response.to_response()
                }
                None => {
                    self.journal
                        .append(JournalRecord::forwarded(&target.host, status.as_u16()))
                        .await;
                    tracing::error!(host = %target.host, key = %key, "Origin answered 304 for an uncached resource");
                    metrics::record_request("revalidation_violation");
                    error_page(
                        StatusCode::BAD_GATEWAY,
                        version,
                        "Origin revalidated an uncached resource",
                    )
                }
            });
        }

        self.journal
            .append(JournalRecord::forwarded(&target.host, status.as_u16()))
            .await;

        if let Some(etag) = response.etag() {
            tracing::debug!(key = %key, etag = %etag, "Caching response");
            self.cache.upsert(
                key,
                CacheEntry {
                    etag,
                    response: response.clone(),
                },
            );
            self.persist_if_dirty().await;
        }

        metrics::record_request("forwarded");
        Ok(response.to_response())
    }

    /// Snapshot the cache off the async workers once enough updates piled up.
    async fn persist_if_dirty(&self) {
        if self.cache.dirty_count() < self.snapshot_threshold {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let threshold = self.snapshot_threshold;
        match tokio::task::spawn_blocking(move || cache.snapshot_if_dirty(threshold)).await {
            Ok(Ok(true)) => tracing::info!(path = ?self.cache.path(), "Cache snapshot persisted"),
            Ok(Ok(false)) => {}
            Ok(Err(e)) => tracing::warn!(path = ?self.cache.path(), error = %e, "Cache snapshot failed"),
            Err(e) => tracing::error!(error = %e, "Cache snapshot task panicked"),
        }
    }
}
