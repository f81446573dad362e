//! Cache store contract and the default in-memory implementation.

use async_trait::async_trait;
use moka::future::Cache;

use crate::{CacheEntry, CacheKey, RiservaError};

/// Key-value persistence for the last known value of each `(symbol, data_type)`.
///
/// Implementations must make `put` an atomic upsert per key (last write wins) and
/// must be safe to call concurrently. Entries are never deleted by the resolver.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up the current entry for `key`.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RiservaError>;

    /// Insert or overwrite the entry for `entry.key`.
    async fn put(&self, entry: CacheEntry) -> Result<(), RiservaError>;

    /// Store name for logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// In-memory store backed by a bounded `moka` cache.
///
/// There is no time-based eviction: freshness is decided by the resolver, and
/// expired entries remain available for stale serving until capacity pressure
/// evicts them.
#[derive(Clone)]
pub struct MemoryCacheStore {
    inner: Cache<CacheKey, CacheEntry>,
}

impl MemoryCacheStore {
    /// Create a store holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Approximate number of entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Flush pending maintenance so `entry_count` is exact.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, RiservaError> {
        Ok(self.inner.get(key).await)
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), RiservaError> {
        self.inner.insert(entry.key.clone(), entry).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
