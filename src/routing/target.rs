//! Request target extraction.
//!
//! # Responsibilities
//! - Pull the origin host, port and path out of a proxy request
//! - Guarantee a trailing `/` on the path
//! - Derive the cache key and the rewritten origin-form target
//!
//! # Design Decisions
//! - Absolute-form targets (`GET http://host/path`) are authoritative
//! - Origin-form targets fall back to the `Host` header
//! - The query string is forwarded and is part of the cache key

use hyper::header::{HeaderValue, HOST};
use hyper::http::uri::Authority;
use hyper::{HeaderMap, Uri};

use crate::cache::CacheKey;

/// Where a proxied request is going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginTarget {
    /// Host name as written in the request (no port).
    pub host: String,
    /// Explicit port from the request, if any.
    pub port: Option<u16>,
    /// Path with a guaranteed trailing `/`.
    pub path: String,
    /// Raw query string, without the `?`.
    pub query: Option<String>,
}

impl OriginTarget {
    /// Extract the target from a request URI and headers.
    ///
    /// Returns `None` when no host can be determined.
    pub fn from_request(uri: &Uri, headers: &HeaderMap) -> Option<Self> {
        let authority = match uri.authority() {
            Some(authority) => authority.clone(),
            None => headers
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<Authority>().ok())?,
        };

        let host = authority.host();
        if host.is_empty() {
            return None;
        }

        Some(Self {
            host: host.to_string(),
            port: authority.port_u16(),
            path: normalize_path(uri.path()),
            query: uri.query().map(str::to_string),
        })
    }

    /// Cache key for this target.
    ///
    /// The query string is deliberately part of the key, unlike a plain
    /// `host + path` key: `/search?q=a` and `/search?q=b` are different
    /// resources. The trailing `/` is inserted before the `?`.
    pub fn cache_key(&self) -> CacheKey {
        match &self.query {
            Some(query) => CacheKey::new(&self.host, &format!("{}?{}", self.path, query)),
            None => CacheKey::new(&self.host, &self.path),
        }
    }

    /// The target to send to the origin: path plus query, kept for the same
    /// reason it is keyed.
    ///
    /// Returns `None` if the rewritten target is not a valid URI.
    pub fn origin_form(&self) -> Option<Uri> {
        let target = match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        };
        target.parse().ok()
    }

    /// Value for the outgoing `Host` header.
    pub fn host_header(&self) -> Option<HeaderValue> {
        let value = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        HeaderValue::from_str(&value).ok()
    }

    /// Host and port to dial, with IPv6 brackets removed.
    pub fn connect_addr(&self, default_port: u16) -> (&str, u16) {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        (host, self.port.unwrap_or(default_port))
    }
}

/// Append a `/` to `path` unless it already ends in one.
pub fn normalize_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
