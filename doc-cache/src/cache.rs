//! File-backed document cache with time-to-live expiry.
//!
//! Every entry lives in its own `<fingerprint>.json` file under the cache
//! root. Writes go to a uniquely named temp file in the same directory and
//! are renamed over the target, so readers only ever observe a complete
//! record and concurrent writers to the same fingerprint simply race to the
//! last rename.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use docground_utils_clock::{SharedClock, system};

use crate::content::ExtractedContent;
use crate::error::{CacheError, Result};
use crate::fingerprint::Fingerprint;

const RECORD_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// One cached page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache key.
    pub fingerprint: Fingerprint,

    /// URL the content was fetched from.
    pub url: String,

    /// The extracted content.
    pub content: ExtractedContent,

    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,

    /// How long the entry stays valid.
    pub ttl_hours: u32,
}

impl CacheEntry {
    /// Whether the entry is still valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < Duration::hours(i64::from(self.ttl_hours))
    }

    /// When the entry stops being valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.fetched_at + Duration::hours(i64::from(self.ttl_hours))
    }
}

/// Statistics about the on-disk cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of records on disk, valid or not.
    pub entries: usize,

    /// Records that have expired but not been evicted yet.
    pub expired: usize,

    /// Total size of all records in bytes.
    pub total_bytes: u64,

    /// Cache root directory.
    pub cache_dir: PathBuf,
}

impl CacheStats {
    /// Total size in kibibytes.
    pub fn total_kib(&self) -> f64 {
        self.total_bytes as f64 / 1024.0
    }
}

/// Durable cache of extracted documentation pages.
///
/// Cheap to clone; clones share the same directory and clock.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    /// Root directory holding one record per fingerprint.
    root: PathBuf,

    /// Time source for expiry checks.
    clock: SharedClock,
}

impl DocumentCache {
    /// Open (creating if needed) a cache rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|e| CacheError::CreateDirectory(format!("{}: {e}", root.display())))?;

        debug!("Opened document cache at {}", root.display());
        Ok(Self {
            root,
            clock: system(),
        })
    }

    /// Replace the clock used for expiry checks.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root
            .join(format!("{}.{RECORD_EXTENSION}", fingerprint.as_str()))
    }

    /// Cached content for `fingerprint`, if present and unexpired.
    ///
    /// Expired and unreadable records are deleted and reported absent.
    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<ExtractedContent> {
        self.get_entry(fingerprint).await.map(|entry| entry.content)
    }

    /// Like [`DocumentCache::get`] but returns the whole record.
    pub async fn get_entry(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let path = self.record_path(fingerprint);
        let now = self.clock.now();
        match self.read_record(&path).await {
            Ok(Some(entry)) if entry.is_valid_at(now) => {
                debug!("Cache hit for {}", entry.url);
                return Some(entry);
            }
            Ok(Some(entry)) => {
                debug!("Cache entry for {} expired at {}", entry.url, entry.expires_at());
            }
            Ok(None) => return None,
            Err(e) => warn!("Discarding unreadable cache record {}: {e}", path.display()),
        }

        if let Err(e) = self.evict_if_stale(&path, now).await {
            warn!("{e}");
        }
        None
    }

    /// Whether a valid entry exists, without evicting anything.
    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        matches!(
            self.read_record(&self.record_path(fingerprint)).await,
            Ok(Some(entry)) if entry.is_valid_at(self.clock.now())
        )
    }

    /// Store (or overwrite) an entry, stamped with the current time.
    pub async fn put(
        &self,
        fingerprint: &Fingerprint,
        url: &str,
        content: ExtractedContent,
        ttl_hours: u32,
    ) -> Result<()> {
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            url: url.to_string(),
            content,
            fetched_at: self.clock.now(),
            ttl_hours,
        };
        let body = serde_json::to_string_pretty(&entry)?;

        let path = self.record_path(fingerprint);
        let temp_path = self.root.join(format!(
            ".{}.{}.{TEMP_EXTENSION}",
            fingerprint.as_str(),
            uuid::Uuid::new_v4().simple()
        ));

        fs::write(&temp_path, &body)
            .await
            .map_err(|e| CacheError::WriteFile(format!("{}: {e}", temp_path.display())))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            self.remove_quietly(&temp_path).await;
            return Err(CacheError::WriteFile(format!("{}: {e}", path.display())));
        }

        debug!("Cached {url} for {ttl_hours}h");
        Ok(())
    }

    /// Remove one entry. Returns whether a record existed.
    pub async fn purge(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let path = self.record_path(fingerprint);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::DeleteFile(format!("{}: {e}", path.display()))),
        }
    }

    /// Remove every expired or unreadable record. Valid entries are untouched.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for path in self.record_paths().await? {
            let stale = match self.read_record(&path).await {
                Ok(Some(entry)) => !entry.is_valid_at(now),
                Ok(None) => false,
                Err(_) => true,
            };
            if stale && self.evict_if_stale(&path, now).await? {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Purged {removed} expired cache entries");
        }
        Ok(removed)
    }

    /// Remove every record and leftover temp file.
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::ReadFile(format!("{}: {e}", self.root.display())))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::ReadFile(format!("{e}")))?
        {
            let path = entry.path();
            let is_record = has_extension(&path, RECORD_EXTENSION);
            if is_record || has_extension(&path, TEMP_EXTENSION) {
                self.delete(&path).await?;
                if is_record {
                    removed += 1;
                }
            }
        }

        info!("Cleared {removed} cache entries");
        Ok(removed)
    }

    /// Count records and their total size.
    pub async fn stats(&self) -> Result<CacheStats> {
        let now = self.clock.now();
        let mut stats = CacheStats {
            entries: 0,
            expired: 0,
            total_bytes: 0,
            cache_dir: self.root.clone(),
        };

        for path in self.record_paths().await? {
            let Ok(meta) = fs::metadata(&path).await else {
                continue;
            };
            stats.entries += 1;
            stats.total_bytes += meta.len();
            match self.read_record(&path).await {
                Ok(Some(entry)) if entry.is_valid_at(now) => {}
                _ => stats.expired += 1,
            }
        }

        Ok(stats)
    }

    async fn record_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| CacheError::ReadFile(format!("{}: {e}", self.root.display())))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::ReadFile(format!("{e}")))?
        {
            let path = entry.path();
            if has_extension(&path, RECORD_EXTENSION) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Read a record. `Ok(None)` when the file does not exist.
    async fn read_record(&self, path: &Path) -> Result<Option<CacheEntry>> {
        let body = match fs::read_to_string(path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::ReadFile(format!("{}: {e}", path.display()))),
        };
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Delete the record at `path` if it is expired or unreadable at `now`.
    ///
    /// The record is first renamed aside, so a fresh record written by a
    /// concurrent `put` after the caller's read is never the one deleted. A
    /// record found valid once aside is linked back, unless a newer record
    /// already took its place. Returns whether a stale record was removed.
    async fn evict_if_stale(&self, path: &Path, now: DateTime<Utc>) -> Result<bool> {
        let aside = self.root.join(format!(
            ".evict.{}.{TEMP_EXTENSION}",
            uuid::Uuid::new_v4().simple()
        ));
        match fs::rename(path, &aside).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(CacheError::DeleteFile(format!("{}: {e}", path.display()))),
        }

        let stale = match self.read_record(&aside).await {
            Ok(Some(entry)) => !entry.is_valid_at(now),
            Ok(None) => return Ok(false),
            Err(_) => true,
        };
        if !stale {
            match fs::hard_link(&aside, path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => warn!("Failed to restore cache record {}: {e}", path.display()),
            }
        }
        self.delete(&aside).await?;
        Ok(stale)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::DeleteFile(format!("{}: {e}", path.display()))),
        }
    }

    async fn remove_quietly(&self, path: &Path) {
        if let Err(e) = self.delete(path).await {
            warn!("{e}");
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}
