//! Riserva resolves market data keys against a freshness-aware cache and an
//! ordered chain of providers.
//!
//! Overview
//! - Every `(symbol, data_type)` key is served from the cache while it is
//!   younger than the data type's TTL; otherwise providers are consulted in
//!   the configured order, each call bounded by its own timeout.
//! - Provider failures are classified as transient, quota or permanent
//!   (`RiservaError::status`). Transient and permanent failures fall through to
//!   the next provider; quota exhaustion ends the chain immediately.
//! - When nothing live is available the last cached value is served with
//!   `stale = true`. With no cached value, single-key resolution falls back to a
//!   deterministic synthetic payload tagged `Source::Synthetic`.
//! - Batches split symbols into chunks, dispatch them concurrently under a
//!   semaphore, use native multi-symbol provider calls when available, and
//!   isolate failures per chunk.
//!
//! Key behaviors and trade-offs
//! - Sequential chains: providers are never raced. Ordering is a preference,
//!   and racing would spend quota on low-priority upstreams even when the
//!   primary answers.
//! - Stale over nothing: a value older than its TTL is usually more useful than
//!   an error, so it is served and flagged rather than withheld.
//! - Soft cache: concurrent resolutions of one key may both write; the last
//!   write wins. Store failures degrade to misses and are never surfaced.
//! - Synthetic data is generated per symbol from a fixed seed, so repeated calls
//!   agree, and it is never written back to the cache.
//!
//! Examples
//! Building an orchestrator with explicit chains:
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use riserva::{DataType, Riserva};
//! use riserva_http::presets;
//!
//! let fmp = Arc::new(presets::fmp("...").build()?.rate_limited().build());
//! let av = Arc::new(presets::alpha_vantage("...").build()?.rate_limited().build());
//!
//! let riserva = Riserva::builder()
//!     .with_provider(fmp.clone())
//!     .with_provider(av.clone())
//!     .prefer_for(DataType::Quote, &[fmp.clone(), av.clone()])
//!     .ttl(DataType::Quote, Duration::from_secs(60))
//!     .provider_timeout(Duration::from_secs(5))
//!     .build()?;
//! ```
//!
//! Resolving one key:
//! ```rust,ignore
//! let quote = riserva.resolve("AAPL", DataType::Quote).await?;
//! if quote.is_degraded() {
//!     // stale cache value or synthetic payload; check `quote.source`
//! }
//! ```
//!
//! Resolving a batch:
//! ```rust,ignore
//! let result = riserva
//!     .batch()
//!     .symbols(["AAPL", "MSFT", "NVDA"])
//!     .data_types(&[DataType::Quote, DataType::Profile])
//!     .chunk_size(50)
//!     .deadline(Duration::from_secs(20))
//!     .run()
//!     .await?;
//! println!("saved {} upstream calls", result.metrics.api_calls_saved);
//! ```
//!
//! See the `demos` crate for runnable end-to-end demonstrations.
#![warn(missing_docs)]

pub(crate) mod core;
mod router;

pub use crate::core::{Riserva, RiservaBuilder};
pub use router::batch::BatchBuilder;
pub use router::util::{
    chunk_symbols, collapse_errors, dedup_data_types, join_until_deadline, normalize_symbols,
};

pub use riserva_middleware::{
    BlacklistMiddleware, BlacklistingProvider, ProviderBuilder, QuotaAwareProvider,
    QuotaMiddleware,
};

// Re-export core types for convenience
pub use riserva_core::{
    BatchMetrics, BatchPayloads, BatchRequest, BatchResult, CacheEntry, CacheKey, CacheStore,
    DataType, DataTypeConfig, DataTypeRegistry, DataTypeSpec, FetchOutcome, FetchStatus,
    MemoryCacheStore, MiddlewareLayer, MiddlewareStack, Provider, ProviderKey, QuotaConfig,
    QuotaConsumptionStrategy, QuotaState, Resolution, RiservaConfig, RiservaError, Source,
    SyntheticGenerator,
};
