//! Host blacklist.
//!
//! # Responsibilities
//! - Load a whitespace-separated list of hosts once at startup
//! - Answer membership queries without locking
//!
//! # Design Decisions
//! - Host matching is case-insensitive (hosts are stored lower-cased)
//! - A missing file means nothing is blocked

use std::collections::HashSet;
use std::path::Path;

/// Immutable set of blocked hosts.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    hosts: HashSet<String>,
}

impl Blacklist {
    /// Load the blacklist file, treating a missing or unreadable file as empty.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let blacklist = Self::parse(&contents);
                tracing::info!(path = ?path, hosts = blacklist.len(), "Blacklist loaded");
                blacklist
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?path, "No blacklist file, no hosts blocked");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Blacklist unreadable, no hosts blocked");
                Self::default()
            }
        }
    }

    /// Parse a whitespace-separated host list.
    pub fn parse(contents: &str) -> Self {
        contents.split_whitespace().collect()
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for Blacklist {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            hosts: iter.into_iter().map(str::to_ascii_lowercase).collect(),
        }
    }
}
