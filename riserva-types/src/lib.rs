//! Riserva data transfer objects, configuration primitives and the unified error type.
#![warn(missing_docs)]

mod batch;
mod cache;
mod config;
mod data_type;
mod error;
mod middleware;
mod outcome;
mod provider;

pub use batch::{BatchMetrics, BatchRequest, BatchResult};
pub use cache::{CacheEntry, CacheKey, Source, normalize_symbol};
pub use config::{
    DataTypeConfig, QuotaConfig, QuotaConsumptionStrategy, QuotaState, RiservaConfig,
};
pub use data_type::DataType;
pub use error::RiservaError;
pub use middleware::{MiddlewareLayer, MiddlewareStack};
pub use outcome::{FetchOutcome, FetchStatus, Resolution};
pub use provider::ProviderKey;
