//! Versioned binary snapshot of the cache map.
//!
//! # Layout (all integers big-endian)
//! ```text
//! magic    "PXCACHE\0"                    8 bytes
//! version  u16                            currently 1
//! count    u32                            number of entries
//! entry*   key      u32 len + utf-8
//!          etag     u32 len + utf-8
//!          status   u16
//!          version  u8   (1 = 1.0, 2 = 1.1)
//!          headers  u32 count, then per header:
//!                   name  u32 len + bytes
//!                   value u32 len + bytes
//!          body     u64 len + bytes
//! ```
//!
//! Duplicate header names are written once per value, in map iteration order,
//! and re-appended in the same order on decode.
//!
//! Entries are replayed to HTTP/1 clients, so only HTTP/1.0 and HTTP/1.1 are
//! representable. Any other version is stored as 1.1.

use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode, Version};
use thiserror::Error;

use crate::cache::{CacheEntry, CacheKey, StoredResponse};

pub const MAGIC: &[u8; 8] = b"PXCACHE\0";
pub const FORMAT_VERSION: u16 = 1;

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a cache snapshot")]
    BadMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    #[error("snapshot truncated while reading {0}")]
    Truncated(&'static str),

    #[error("invalid {field} in snapshot: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("{0} trailing bytes after last entry")]
    TrailingData(usize),
}

/// Encode every entry of the map.
pub fn encode(entries: &HashMap<CacheKey, CacheEntry>) -> Bytes {
    let mut out = BytesMut::with_capacity(64 + entries.len() * 256);
    out.put_slice(MAGIC);
    out.put_u16(FORMAT_VERSION);
    out.put_u32(entries.len() as u32);

    for (key, entry) in entries {
        put_prefixed(&mut out, key.as_str().as_bytes());
        put_prefixed(&mut out, entry.etag.as_bytes());

        let response = &entry.response;
        out.put_u16(response.status.as_u16());
        out.put_u8(version_tag(response.version));

        out.put_u32(response.headers.len() as u32);
        for (name, value) in response.headers.iter() {
            put_prefixed(&mut out, name.as_str().as_bytes());
            put_prefixed(&mut out, value.as_bytes());
        }

        out.put_u64(response.body.len() as u64);
        out.put_slice(&response.body);
    }

    out.freeze()
}

/// Decode a snapshot produced by [`encode`].
pub fn decode(mut buf: Bytes) -> Result<HashMap<CacheKey, CacheEntry>, SnapshotError> {
    if buf.remaining() < MAGIC.len() || &buf[..MAGIC.len()] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    buf.advance(MAGIC.len());

    let version = take_u16(&mut buf, "format version")?;
    if version != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }

    let count = take_u32(&mut buf, "entry count")? as usize;
    let mut entries = HashMap::with_capacity(count.min(4096));

    for _ in 0..count {
        let key = take_string(&mut buf, "key")?;
        let etag = take_string(&mut buf, "etag")?;

        let status_code = take_u16(&mut buf, "status")?;
        let status = StatusCode::from_u16(status_code).map_err(|e| SnapshotError::Invalid {
            field: "status",
            reason: e.to_string(),
        })?;
        let version = version_from_tag(take_u8(&mut buf, "http version")?)?;

        let header_count = take_u32(&mut buf, "header count")? as usize;
        let mut headers = HeaderMap::with_capacity(header_count.min(256));
        for _ in 0..header_count {
            let name = take_prefixed(&mut buf, "header name")?;
            let value = take_prefixed(&mut buf, "header value")?;
            let name = HeaderName::from_bytes(&name).map_err(|e| SnapshotError::Invalid {
                field: "header name",
                reason: e.to_string(),
            })?;
            let value = HeaderValue::from_maybe_shared(value).map_err(|e| SnapshotError::Invalid {
                field: "header value",
                reason: e.to_string(),
            })?;
            headers.append(name, value);
        }

        let body_len = take_u64(&mut buf, "body length")?;
        let body = take_bytes(&mut buf, body_len, "body")?;

        entries.insert(
            CacheKey::from(key),
            CacheEntry {
                etag,
                response: StoredResponse {
                    status,
                    version,
                    headers,
                    body,
                },
            },
        );
    }

    if buf.has_remaining() {
        return Err(SnapshotError::TrailingData(buf.remaining()));
    }

    Ok(entries)
}

fn put_prefixed(out: &mut BytesMut, bytes: &[u8]) {
    out.put_u32(bytes.len() as u32);
    out.put_slice(bytes);
}

fn take_u8(buf: &mut Bytes, what: &'static str) -> Result<u8, SnapshotError> {
    if buf.remaining() < 1 {
        return Err(SnapshotError::Truncated(what));
    }
    Ok(buf.get_u8())
}

fn take_u16(buf: &mut Bytes, what: &'static str) -> Result<u16, SnapshotError> {
    if buf.remaining() < 2 {
        return Err(SnapshotError::Truncated(what));
    }
    Ok(buf.get_u16())
}

fn take_u32(buf: &mut Bytes, what: &'static str) -> Result<u32, SnapshotError> {
    if buf.remaining() < 4 {
        return Err(SnapshotError::Truncated(what));
    }
    Ok(buf.get_u32())
}

fn take_u64(buf: &mut Bytes, what: &'static str) -> Result<u64, SnapshotError> {
    if buf.remaining() < 8 {
        return Err(SnapshotError::Truncated(what));
    }
    Ok(buf.get_u64())
}

fn take_bytes(buf: &mut Bytes, len: u64, what: &'static str) -> Result<Bytes, SnapshotError> {
    if (buf.remaining() as u64) < len {
        return Err(SnapshotError::Truncated(what));
    }
    Ok(buf.split_to(len as usize))
}

fn take_prefixed(buf: &mut Bytes, what: &'static str) -> Result<Bytes, SnapshotError> {
    let len = take_u32(buf, what)?;
    take_bytes(buf, u64::from(len), what)
}

fn take_string(buf: &mut Bytes, what: &'static str) -> Result<String, SnapshotError> {
    let raw = take_prefixed(buf, what)?;
    String::from_utf8(raw.to_vec()).map_err(|e| SnapshotError::Invalid {
        field: what,
        reason: e.to_string(),
    })
}

fn version_tag(version: Version) -> u8 {
    match version {
        Version::HTTP_10 => 1,
        _ => 2,
    }
}

fn version_from_tag(tag: u8) -> Result<Version, SnapshotError> {
    match tag {
        1 => Ok(Version::HTTP_10),
        2 => Ok(Version::HTTP_11),
        other => Err(SnapshotError::Invalid {
            field: "http version",
            reason: format!("unknown tag {}", other),
        }),
    }
}
