//! Batch request/response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DataType, FetchOutcome};

/// Resolve many symbols across several data types in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Raw symbols; normalized and de-duplicated by the orchestrator.
    pub symbols: Vec<String>,
    /// Data types ("endpoints") to resolve for every symbol.
    pub data_types: Vec<DataType>,
    /// Override of the configured chunk size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Override of the configured overall deadline, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl BatchRequest {
    /// Convenience constructor.
    pub fn new<S: Into<String>>(
        symbols: impl IntoIterator<Item = S>,
        data_types: impl IntoIterator<Item = DataType>,
    ) -> Self {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            data_types: data_types.into_iter().collect(),
            chunk_size: None,
            deadline_ms: None,
        }
    }
}

/// Aggregate counters computed after every chunk settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// Distinct symbols after normalization.
    pub symbols_requested: usize,
    /// Distinct data types requested.
    pub endpoints_requested: usize,
    /// Outcomes that carry a payload.
    pub total_data_points: usize,
    /// Provider calls actually issued (a multi-symbol call counts once).
    pub api_calls_made: usize,
    /// `symbols_requested * endpoints_requested - api_calls_made`, floored at zero.
    pub api_calls_saved: usize,
    /// Outcomes served fresh from the cache.
    pub cache_hits: usize,
    /// Outcomes served from a stale cache entry.
    pub stale_served: usize,
    /// Outcomes without a payload.
    pub errors: usize,
    /// Chunks dispatched.
    pub chunks: usize,
    /// Chunks that failed as a whole (panic or deadline).
    pub chunks_failed: usize,
}

/// Result of a batch resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Normalized symbols in first-seen order.
    pub symbols: Vec<String>,
    /// `data[data_type][symbol]`.
    pub data: BTreeMap<DataType, BTreeMap<String, FetchOutcome>>,
    /// Aggregate counters.
    pub metrics: BatchMetrics,
}

impl BatchResult {
    /// Look up the outcome for a data type and (normalized) symbol.
    #[must_use]
    pub fn get(&self, data_type: DataType, symbol: &str) -> Option<&FetchOutcome> {
        self.data.get(&data_type).and_then(|m| m.get(symbol))
    }

    /// Iterate over every `(data_type, symbol, outcome)` cell.
    pub fn cells(&self) -> impl Iterator<Item = (DataType, &str, &FetchOutcome)> {
        self.data.iter().flat_map(|(dt, m)| {
            m.iter()
                .map(move |(sym, outcome)| (*dt, sym.as_str(), outcome))
        })
    }
}
