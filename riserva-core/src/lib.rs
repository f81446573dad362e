//! riserva-core
//!
//! Contracts and building blocks shared across the riserva workspace.
//!
//! - `provider`: the `Provider` trait implemented by upstream data sources.
//! - `store`: the `CacheStore` trait and the `moka`-backed `MemoryCacheStore`.
//! - `registry`: per data type TTL, provider chain and chunk size.
//! - `synthetic`: deterministic last-resort payloads.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The orchestrator bounds provider calls with `tokio::time::timeout` and gates
//! batch fan-out with `tokio::sync::Semaphore`, so providers and stores must be
//! driven from a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Middleware trait implemented by provider wrappers.
pub mod middleware;
/// Payload inspection helpers.
pub mod payload;
/// The `Provider` trait.
pub mod provider;
/// Data type registry.
pub mod registry;
/// Cache store contract and in-memory implementation.
pub mod store;
/// Deterministic synthetic payloads.
pub mod synthetic;

pub use middleware::Middleware;
pub use payload::is_empty_payload;
pub use provider::{BatchPayloads, Provider};
pub use registry::{DataTypeRegistry, DataTypeSpec};
pub use store::{CacheStore, MemoryCacheStore};
pub use synthetic::SyntheticGenerator;

pub use riserva_types::*;
