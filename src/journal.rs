//! Append-only audit journal of proxying outcomes.
//!
//! One line per outcome, flushed before `append` returns:
//! ```text
//! example.com 200
//! Cached: example.com 304
//! ```
//! The journal has its own lock and is never written while the cache lock is
//! held. Write failures are reported to the operator log and otherwise ignored.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::observability::metrics;

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    /// The origin answered and its response was passed through.
    Forwarded { host: String, status: u16 },
    /// The origin answered 304 and the cached response was served.
    Cached { host: String, status: u16 },
}

impl JournalRecord {
    pub fn forwarded(host: impl Into<String>, status: u16) -> Self {
        Self::Forwarded {
            host: host.into(),
            status,
        }
    }

    pub fn cached(host: impl Into<String>, status: u16) -> Self {
        Self::Cached {
            host: host.into(),
            status,
        }
    }
}

impl std::fmt::Display for JournalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalRecord::Forwarded { host, status } => write!(f, "{} {}", host, status),
            JournalRecord::Cached { host, status } => write!(f, "Cached: {} {}", host, status),
        }
    }
}

/// Journal file handle shared by all sessions.
#[derive(Debug)]
pub struct Journal {
    file: Mutex<File>,
    path: PathBuf,
}

impl Journal {
    /// Create or truncate the journal at `path`.
    pub async fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;

        tracing::info!(path = ?path, "Journal opened");
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and flush it.
    pub async fn append(&self, record: JournalRecord) {
        let line = format!("{}\n", record);
        if let Err(e) = self.write_line(line.as_bytes()).await {
            metrics::record_journal_failure();
            tracing::error!(path = ?self.path, record = %record, error = %e, "Failed to write journal");
        }
    }

    async fn write_line(&self, line: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock().await;
        file.write_all(line).await?;
        file.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("caching-proxy-journal-{}-{}.txt", name, std::process::id()))
    }

    #[test]
    fn record_formats() {
        assert_eq!(JournalRecord::forwarded("a.com", 200).to_string(), "a.com 200");
        assert_eq!(JournalRecord::cached("a.com", 304).to_string(), "Cached: a.com 304");
    }

    #[tokio::test]
    async fn create_truncates_previous_run() {
        let path = scratch_path("truncate");
        std::fs::write(&path, "stale.com 500\n").unwrap();

        let journal = Journal::create(&path).await.unwrap();
        journal.append(JournalRecord::forwarded("fresh.com", 200)).await;

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh.com 200\n");
        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_never_interleave() {
        let path = scratch_path("concurrent");
        let journal = Arc::new(Journal::create(&path).await.unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|t| {
                let journal = Arc::clone(&journal);
                tokio::spawn(async move {
                    for _ in 0..25 {
                        journal
                            .append(JournalRecord::forwarded(format!("host-{}.example.com", t), 200))
                            .await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 16 * 25);
        for line in lines {
            let (host, status) = line.split_once(' ').unwrap();
            assert!(host.starts_with("host-") && host.ends_with(".example.com"), "torn line: {line}");
            assert_eq!(status, "200");
        }
        std::fs::remove_file(&path).unwrap_or_default();
    }
}
