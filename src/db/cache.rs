use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Cache TTL for aggregate dataset statistics
pub const STATS_CACHE_TTL: u64 = 300; // 5 minutes
/// Cache TTL for trainee search listings
pub const SEARCH_CACHE_TTL: u64 = 120; // 2 minutes

/// Stable cache key derived from an operation name and its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Statistics,
    TraineeSearch(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Statistics => write!(f, "stats"),
            CacheKey::TraineeSearch(query) => write!(f, "search:{}", query.to_lowercase()),
        }
    }
}

/// A cached value with its expiry instant
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process TTL cache for expensive aggregate queries.
///
/// Entries are evicted lazily on the next lookup after expiry; there is no
/// refresh-on-read and no background sweeper. Two tasks racing on the same
/// missing key both compute and both store; the second write wins. Callers
/// must not depend on single-writer exclusivity.
#[derive(Clone, Default)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a value from the cache by key.
    ///
    /// Returns `None` on a miss or when the entry has expired; an expired
    /// entry is removed before returning.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let key = format!("{}", key);
        let now = Instant::now();

        let expired = {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(now) => {
                    let data = serde_json::from_str(&entry.value).map_err(|e| {
                        AppError::Internal(format!("Cache deserialization error: {}", e))
                    })?;
                    return Ok(Some(data));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            let mut entries = self.entries.write().await;
            // Re-check under the write lock; a racing store may have
            // replaced the entry with a fresh one.
            if entries.get(&key).is_some_and(|e| e.is_expired(now)) {
                entries.remove(&key);
                tracing::debug!(key = %key, "Evicted expired cache entry");
            }
        }

        Ok(None)
    }

    /// Stores a value under the key with the given TTL in seconds.
    ///
    /// Serialization failures are logged and swallowed; a cache store must
    /// never fail the request that computed the value.
    pub async fn store<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let entry = CacheEntry {
            value: json,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };

        let mut entries = self.entries.write().await;
        entries.insert(format!("{}", key), entry);
    }

    /// Drops every entry. Invoked on bulk dataset reimport; there is no
    /// finer-grained invalidation.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        tracing::info!(dropped, "Result cache cleared");
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
