use crate::core::provider::ProviderId;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

/*-------------------------------------------------------------------------------------------------
  Range Cache Interface
-------------------------------------------------------------------------------------------------*/

/// Namespace under which provider ranges are cached.
pub const CACHE_NAMESPACE: &str = "cloud_ranges";

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),

    #[error("cache operation error: {0}")]
    Operation(String),

    #[error("malformed cache entry for {key}: {message}")]
    Malformed { key: String, message: String },
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Key/value store with per-entry time-to-live, keyed by `(namespace, provider)`.
///
/// Caching is best effort: the registry treats any error as a miss and falls through to the
/// provider's fetcher.
#[async_trait]
pub trait RangeCache: Send + Sync {
    /// Returns `Ok(None)` when the entry is missing or expired.
    async fn get(&self, namespace: &str, provider: ProviderId) -> CacheResult<Option<String>>;

    async fn set(
        &self,
        namespace: &str,
        provider: ProviderId,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<()>;
}

/// Flat textual key shared by the cache implementations, e.g. `cloud_ranges:AWS`.
pub fn cache_key(namespace: &str, provider: ProviderId) -> String {
    format!("{namespace}:{provider}")
}

fn expiry(ttl: Duration) -> DateTime<Utc> {
    let ttl = TimeDelta::from_std(ttl).unwrap_or_else(|_| TimeDelta::days(36500));
    Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/*-------------------------------------------------------------------------------------------------
  Memory Cache
-------------------------------------------------------------------------------------------------*/

/// In-process cache; entries expire lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RangeCache for MemoryCache {
    async fn get(&self, namespace: &str, provider: ProviderId) -> CacheResult<Option<String>> {
        let key = cache_key(namespace, provider);
        let entries = self.entries.read().await;
        match entries.get(&key) {
            Some((value, expires_at)) if *expires_at > Utc::now() => {
                debug!("Cache HIT: {key}");
                Ok(Some(value.clone()))
            }
            Some(_) => {
                debug!("Cache EXPIRED: {key}");
                Ok(None)
            }
            None => {
                debug!("Cache MISS: {key}");
                Ok(None)
            }
        }
    }

    async fn set(
        &self,
        namespace: &str,
        provider: ProviderId,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<()> {
        let key = cache_key(namespace, provider);
        debug!("Cache SET: {key} (TTL: {}s)", ttl.as_secs());
        self.entries
            .write()
            .await
            .insert(key, (value.to_string(), expiry(ttl)));
        Ok(())
    }
}

/*-------------------------------------------------------------------------------------------------
  File Cache
-------------------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize, Serialize)]
struct FileCacheEntry {
    expires_at: DateTime<Utc>,
    value: String,
}

/// Cache persisted as one JSON file per key under a directory, so ranges survive between runs of
/// the command line tool.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, namespace: &str, provider: ProviderId) -> PathBuf {
        self.dir.join(namespace).join(format!("{provider}.json"))
    }
}

#[async_trait]
impl RangeCache for FileCache {
    async fn get(&self, namespace: &str, provider: ProviderId) -> CacheResult<Option<String>> {
        let path = self.path(namespace, provider);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!("Cache file not found: {:?}", &path);
                return Ok(None);
            }
            Err(error) => {
                return Err(CacheError::Operation(format!(
                    "failed to read {:?}: {}",
                    &path, error
                )))
            }
        };

        let entry: FileCacheEntry =
            serde_json::from_str(&contents).map_err(|error| CacheError::Malformed {
                key: cache_key(namespace, provider),
                message: error.to_string(),
            })?;

        if entry.expires_at <= Utc::now() {
            info!("Cache file is stale: {:?}", &path);
            return Ok(None);
        }

        info!("Cache file is fresh: {:?}", &path);
        Ok(Some(entry.value))
    }

    async fn set(
        &self,
        namespace: &str,
        provider: ProviderId,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<()> {
        let path = self.path(namespace, provider);
        let entry = FileCacheEntry {
            expires_at: expiry(ttl),
            value: value.to_string(),
        };
        let contents = serde_json::to_string(&entry)
            .map_err(|error| CacheError::Operation(error.to_string()))?;

        // Ensure parent directories exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| CacheError::Operation(error.to_string()))?;
        }

        tokio::fs::write(&path, contents)
            .await
            .inspect(|_| info!("Successfully cached {provider} ranges to: {:?}", &path))
            .map_err(|error| {
                warn!("Failed to cache {provider} ranges to `{:?}`: {}", &path, error);
                CacheError::Operation(error.to_string())
            })
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test_log::test(tokio::test)]
    async fn test_memory_cache_get_and_set() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty().await);
        assert_eq!(cache.get(CACHE_NAMESPACE, ProviderId::Aws).await.unwrap(), None);

        cache
            .set(CACHE_NAMESPACE, ProviderId::Aws, "10.0.0.0/8", HOUR)
            .await
            .unwrap();
        assert_eq!(
            cache.get(CACHE_NAMESPACE, ProviderId::Aws).await.unwrap(),
            Some("10.0.0.0/8".to_string())
        );
        assert_eq!(cache.get(CACHE_NAMESPACE, ProviderId::Gcp).await.unwrap(), None);
        assert_eq!(cache.get("other", ProviderId::Aws).await.unwrap(), None);
        assert_eq!(cache.len().await, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_memory_cache_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set(CACHE_NAMESPACE, ProviderId::Gcp, "10.0.0.0/8", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(cache.get(CACHE_NAMESPACE, ProviderId::Gcp).await.unwrap(), None);
    }

    #[test_log::test(tokio::test)]
    async fn test_file_cache_get_and_set() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        assert_eq!(cache.get(CACHE_NAMESPACE, ProviderId::Azure).await.unwrap(), None);

        cache
            .set(CACHE_NAMESPACE, ProviderId::Azure, "20.0.0.0/8", HOUR)
            .await
            .unwrap();
        assert!(dir.path().join("cloud_ranges").join("Azure.json").exists());
        assert_eq!(
            cache.get(CACHE_NAMESPACE, ProviderId::Azure).await.unwrap(),
            Some("20.0.0.0/8".to_string())
        );

        // A second instance over the same directory sees the entry.
        let reopened = FileCache::new(dir.path());
        assert!(reopened
            .get(CACHE_NAMESPACE, ProviderId::Azure)
            .await
            .unwrap()
            .is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_file_cache_stale_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache
            .set(CACHE_NAMESPACE, ProviderId::Aws, "10.0.0.0/8", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(cache.get(CACHE_NAMESPACE, ProviderId::Aws).await.unwrap(), None);
    }

    #[test_log::test(tokio::test)]
    async fn test_file_cache_unwritable_directory_is_an_operation_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cache = FileCache::new(file.path());
        let result = cache
            .set(CACHE_NAMESPACE, ProviderId::Aws, "10.0.0.0/8", HOUR)
            .await;
        assert!(matches!(result, Err(CacheError::Operation(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_file_cache_malformed_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let path = dir.path().join("cloud_ranges").join("GCP.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let result = cache.get(CACHE_NAMESPACE, ProviderId::Gcp).await;
        assert!(matches!(result, Err(CacheError::Malformed { .. })));
    }
}
