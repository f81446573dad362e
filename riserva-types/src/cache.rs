//! Cache keys, cached entries and value attribution.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DataType, ProviderKey, RiservaError};

/// Canonicalize a raw symbol: trim surrounding whitespace and uppercase.
///
/// Returns `None` for blank input.
#[must_use]
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_ascii_uppercase())
    }
}

/// Composite cache key: one entry per `(symbol, data_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    symbol: String,
    data_type: DataType,
}

impl CacheKey {
    /// Build a key from a raw symbol, normalizing it.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the symbol is blank.
    pub fn new(symbol: &str, data_type: DataType) -> Result<Self, RiservaError> {
        let symbol = normalize_symbol(symbol)
            .ok_or_else(|| RiservaError::InvalidArg("symbol must not be blank".to_string()))?;
        Ok(Self { symbol, data_type })
    }

    /// Normalized symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Requested data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.data_type)
    }
}

/// Where a served value came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider", rename_all = "lowercase")]
pub enum Source {
    /// Served from the cache store.
    Cache,
    /// Fetched live from the named provider.
    Provider(ProviderKey),
    /// Generated by the deterministic synthetic generator.
    Synthetic,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => f.write_str("cache"),
            Self::Provider(key) => write!(f, "provider({key})"),
            Self::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// Last known value for a cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key this entry belongs to.
    pub key: CacheKey,
    /// Normalized payload as produced by the provider's normalizer.
    pub payload: serde_json::Value,
    /// Origin of the payload at the time it was written.
    pub source: Source,
    /// Write timestamp.
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(key: CacheKey, payload: serde_json::Value, source: Source) -> Self {
        Self::at(key, payload, source, Utc::now())
    }

    /// Create an entry with an explicit timestamp.
    #[must_use]
    pub const fn at(
        key: CacheKey,
        payload: serde_json::Value,
        source: Source,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            payload,
            source,
            last_updated,
        }
    }

    /// Age of the entry relative to `now`. Timestamps in the future count as age zero.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_updated).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry is younger than `ttl`.
    #[must_use]
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}
