//! Thread-safe cache store with snapshot persistence.
//!
//! # Responsibilities
//! - Map cache keys to entries under a single lock
//! - Count updates since the last snapshot (dirty counter)
//! - Write and read whole-map snapshots
//!
//! # Design Decisions
//! - One `std::sync::Mutex` guards both the map and the counter
//! - Lookups hand out clones; nothing borrowed from the map escapes the lock
//! - Snapshots hold the lock while encoding and writing, so the file on disk is
//!   always an image of the map at a single instant
//! - Writes go to a temporary file that is renamed over the snapshot

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::cache::snapshot::{self, SnapshotError};
use crate::cache::{CacheEntry, CacheKey};
use crate::observability::metrics;

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    dirty: u64,
}

/// Shared response cache backed by a snapshot file.
pub struct CacheStore {
    state: Mutex<CacheState>,
    path: PathBuf,
}

impl CacheStore {
    /// Create an empty store that snapshots to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            path: path.into(),
        }
    }

    /// Create a store and populate it from `path`, starting empty if the
    /// snapshot is missing or unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        match store.load_from_disk() {
            Ok(count) => {
                tracing::info!(path = ?store.path, entries = count, "Cache snapshot loaded");
            }
            Err(SnapshotError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?store.path, "No cache snapshot found, starting empty");
            }
            Err(e) => {
                tracing::warn!(path = ?store.path, error = %e, "Discarding unreadable cache snapshot");
            }
        }
        store
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().entries.get(key).cloned()
    }

    /// Insert or overwrite the entry for `key` and bump the dirty counter.
    pub fn upsert(&self, key: CacheKey, entry: CacheEntry) {
        let mut state = self.lock();
        state.entries.insert(key, entry);
        state.dirty += 1;
        metrics::record_cache_size(state.entries.len());
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Updates since the last successful snapshot.
    pub fn dirty_count(&self) -> u64 {
        self.lock().dirty
    }

    /// Write the whole map to disk and reset the dirty counter.
    ///
    /// Returns the number of entries written. On failure the counter is left
    /// untouched so the next threshold check tries again.
    pub fn snapshot_to_disk(&self) -> Result<usize, SnapshotError> {
        let mut state = self.lock();
        self.write_snapshot(&mut state)
    }

    /// Snapshot only if at least `threshold` updates are pending.
    ///
    /// The check and the write happen under the same lock, so concurrent
    /// callers produce at most one snapshot per batch of updates.
    pub fn snapshot_if_dirty(&self, threshold: u64) -> Result<bool, SnapshotError> {
        let mut state = self.lock();
        if state.dirty < threshold {
            return Ok(false);
        }
        self.write_snapshot(&mut state)?;
        Ok(true)
    }

    /// Replace the in-memory map with the snapshot on disk.
    ///
    /// On any error the map is left empty.
    pub fn load_from_disk(&self) -> Result<usize, SnapshotError> {
        let mut state = self.lock();
        state.entries.clear();
        state.dirty = 0;

        let raw = fs::read(&self.path)?;
        let entries = snapshot::decode(Bytes::from(raw))?;
        state.entries = entries;
        metrics::record_cache_size(state.entries.len());
        Ok(state.entries.len())
    }

    fn write_snapshot(&self, state: &mut CacheState) -> Result<usize, SnapshotError> {
        let encoded = snapshot::encode(&state.entries);
        let tmp = self.path.with_extension("bin.tmp");

        let result = fs::write(&tmp, &encoded).and_then(|()| fs::rename(&tmp, &self.path));
        metrics::record_snapshot(result.is_ok());
        result?;

        state.dirty = 0;
        tracing::debug!(
            path = ?self.path,
            entries = state.entries.len(),
            bytes = encoded.len(),
            "Cache snapshot written"
        );
        Ok(state.entries.len())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The map is never left half-updated, so a panic elsewhere does not
        // invalidate it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Must not take the lock: formatting can happen while it is held.
        f.debug_struct("CacheStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
