//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy router
//!     → store.rs (lookup / upsert under one lock, dirty counter)
//!     → snapshot.rs (versioned binary encoding of the whole map)
//!     → cache.bin (written when the dirty counter reaches the threshold)
//!
//! Startup:
//!     cache.bin → snapshot.rs (decode) → store.rs (replace map)
//! ```
//!
//! # Design Decisions
//! - Entries are revalidated with the origin on every request, never served blind
//! - No eviction and no size bound
//! - Snapshots are best-effort; a missing or corrupt file means an empty cache

pub mod snapshot;
pub mod store;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::ETAG;
use hyper::{HeaderMap, Response, StatusCode, Version};

pub use snapshot::SnapshotError;
pub use store::CacheStore;

/// Key under which an origin representation is cached.
///
/// Formed as `host + "/" + path`, where the path always ends in `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(host: &str, normalized_path: &str) -> Self {
        Self(format!("{}/{}", host, normalized_path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully buffered origin response.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl StoredResponse {
    /// The `ETag` validator, if the origin sent a printable one.
    pub fn etag(&self) -> Option<String> {
        self.headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Rebuild a response that can be written back to the client.
    pub fn to_response(&self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.clone()));
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// A cached representation and the validator it was served with.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub etag: String,
    pub response: StoredResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn key_joins_host_and_path() {
        assert_eq!(CacheKey::new("a.com", "/").as_str(), "a.com//");
        assert_eq!(CacheKey::new("a.com", "/docs/").as_str(), "a.com//docs/");
    }

    #[test]
    fn etag_is_read_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"v1\""));
        let stored = StoredResponse {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers,
            body: Bytes::new(),
        };
        assert_eq!(stored.etag().as_deref(), Some("\"v1\""));
    }

    #[test]
    fn to_response_preserves_everything() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        let stored = StoredResponse {
            status: StatusCode::NOT_FOUND,
            version: Version::HTTP_11,
            headers: headers.clone(),
            body: Bytes::from_static(b"missing"),
        };

        let response = stored.to_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers(), &headers);
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
    }
}
