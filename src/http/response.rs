//! Proxy-generated responses.
//!
//! Origin responses are passed through untouched; only the rejections the
//! proxy produces on its own are built here.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode, Version};

/// Value of the `Server` header on proxy-generated responses.
pub const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build a `text/html` response carrying a human-readable message.
pub fn error_page(status: StatusCode, version: Version, message: &str) -> Response<Full<Bytes>> {
    let body = Bytes::from(message.to_string());
    let length = body.len();

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.version_mut() = version;

    let headers = response.headers_mut();
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}

/// A 400 rejection.
pub fn bad_request(version: Version, message: &str) -> Response<Full<Bytes>> {
    error_page(StatusCode::BAD_REQUEST, version, message)
}
