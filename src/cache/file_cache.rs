//! Directory-backed HTTP response cache
//!
//! Each cached response is one JSON file named after the SHA-256 of the
//! request URL. Entries can carry an expiry; stale entries are treated as
//! misses and overwritten by the next network fetch.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// A cached HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// URL the request was made for (the cache key)
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    pub status_code: u16,

    pub body: String,

    /// When the response was received from the network
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(url: &str, final_url: &str, status_code: u16, body: String) -> Self {
        Self {
            url: url.to_string(),
            final_url: final_url.to_string(),
            status_code,
            body,
            fetched_at: Utc::now(),
        }
    }

    /// Returns the age of the cached response
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Response cache rooted at a directory, shared across sessions
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl ResponseCache {
    /// Creates a cache; the directory is created lazily on first write
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file holding the entry for `url`
    pub fn entry_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    /// Whether a response with this status may be cached
    pub fn is_cacheable(status_code: u16) -> bool {
        (200..300).contains(&status_code)
    }

    /// Looks up a fresh entry for `url`
    ///
    /// Missing, unreadable, corrupt, and expired entries are all misses.
    pub async fn get(&self, url: &str) -> Option<CachedResponse> {
        let path = self.entry_path(url);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!("Cache read failed for {}: {}", path.display(), e);
                return None;
            }
        };

        let entry: CachedResponse = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Ignoring corrupt cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        // Guard against hash collisions and hand-edited files
        if entry.url != url {
            return None;
        }

        if let Some(ttl) = self.ttl {
            if entry.age() > ttl {
                tracing::debug!("Cache entry for {} expired", url);
                return None;
            }
        }

        Some(entry)
    }

    /// Stores an entry, replacing any previous one for the same URL
    pub async fn put(&self, entry: &CachedResponse) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec(entry).map_err(io::Error::other)?;

        // Write then rename so a concurrent reader never sees a partial file
        let path = self.entry_path(&entry.url);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await
    }
}
