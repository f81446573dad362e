//! Configuration types shared across the orchestrator and middleware.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::DataType;

/// Strategy for consuming units from a quota when handling requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum QuotaConsumptionStrategy {
    /// Each request deducts exactly one unit from the quota budget.
    #[default]
    Unit,
    /// Spread the window budget evenly across 24 slices.
    EvenSpreadHourly,
    /// Multi-symbol requests deduct one unit per symbol.
    Weighted,
}

/// Configuration for a token-like quota budget over a fixed window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of units that may be consumed within a single window.
    pub limit: u64,
    /// Duration of the accounting window.
    pub window: Duration,
    /// Strategy for how requests consume units from the budget.
    pub strategy: QuotaConsumptionStrategy,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            window: Duration::from_secs(60),
            strategy: QuotaConsumptionStrategy::Unit,
        }
    }
}

/// Snapshot of a quota budget at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    /// Configured maximum units per window.
    pub limit: u64,
    /// Remaining units available in the current window.
    pub remaining: u64,
    /// Time remaining until the current window resets.
    pub reset_in: Duration,
}

/// Per data type settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTypeConfig {
    /// Freshness threshold in milliseconds; `None` uses [`DataType::default_ttl`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
    /// Provider keys in priority order. Empty means "every registered provider
    /// that supports this data type, in registration order".
    pub provider_order: Vec<String>,
    /// Batch chunk size for this data type; falls back to the global setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

impl DataTypeConfig {
    /// Effective TTL for `data_type`.
    #[must_use]
    pub fn ttl(&self, data_type: DataType) -> Duration {
        self.ttl_ms
            .map_or_else(|| data_type.default_ttl(), Duration::from_millis)
    }
}

/// Global configuration for the `Riserva` orchestrator.
///
/// Every field has a default so partial JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiservaConfig {
    /// Per data type TTLs, provider order and chunk sizes.
    pub data_types: BTreeMap<DataType, DataTypeConfig>,
    /// Default number of symbols per batch chunk.
    pub chunk_size: usize,
    /// Timeout for individual provider calls, in milliseconds.
    pub provider_timeout_ms: u64,
    /// Maximum number of batch chunks in flight at once.
    pub max_concurrency: usize,
    /// Optional overall deadline for batch calls, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_deadline_ms: Option<u64>,
    /// Generate a synthetic payload when the chain is exhausted and no cache entry exists.
    pub synthetic_fallback: bool,
    /// Capacity of the default in-memory cache store.
    pub cache_capacity: u64,
}

impl Default for RiservaConfig {
    fn default() -> Self {
        Self {
            data_types: BTreeMap::new(),
            chunk_size: 10,
            provider_timeout_ms: 5_000,
            max_concurrency: 3,
            batch_deadline_ms: None,
            synthetic_fallback: true,
            cache_capacity: 10_000,
        }
    }
}

impl RiservaConfig {
    /// Per-provider call timeout.
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Overall batch deadline, if configured.
    #[must_use]
    pub fn batch_deadline(&self) -> Option<Duration> {
        self.batch_deadline_ms.map(Duration::from_millis)
    }

    /// Effective TTL for a data type.
    #[must_use]
    pub fn ttl(&self, data_type: DataType) -> Duration {
        self.data_types
            .get(&data_type)
            .map_or_else(|| data_type.default_ttl(), |c| c.ttl(data_type))
    }
}
