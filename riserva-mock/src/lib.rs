//! Mock providers for CI-safe tests and demos.
//!
//! - [`MockProvider`] serves deterministic fixtures and reacts to magic symbols.
//! - [`dynamic`] exposes a provider whose behavior is scripted from the test.

use std::time::Duration;

use async_trait::async_trait;
use riserva_core::{BatchPayloads, DataType, Provider, RiservaError};
use serde_json::Value;

pub mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockProvider, MockBehavior};
pub use fixtures::SYMBOLS;

/// Mock provider with deterministic fixture data.
///
/// Magic symbols:
/// - `FAIL`: transient connector error;
/// - `QUOTA`: quota exceeded (a batch containing it fails as a whole);
/// - `TIMEOUT`: sleeps for 200ms, then answers not found;
/// - `EMPTY`: succeeds with a `null` payload.
///
/// Any other symbol without a fixture is not found.
pub struct MockProvider {
    name: &'static str,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Mock registered under the name `riserva-mock`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: "riserva-mock",
        }
    }

    /// Mock registered under a custom name, to build multi-provider chains.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self { name }
    }

    async fn answer(&self, symbol: &str, data_type: DataType) -> Result<Value, RiservaError> {
        match symbol {
            "FAIL" => Err(RiservaError::connector(
                self.name,
                format!("forced failure: {data_type}"),
            )),
            "QUOTA" => Err(RiservaError::quota_exceeded(self.name)),
            "EMPTY" => Ok(Value::Null),
            "TIMEOUT" => {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Err(RiservaError::not_found(format!("{data_type} for {symbol}")))
            }
            _ => fixtures::payload(symbol, data_type)
                .ok_or_else(|| RiservaError::not_found(format!("{data_type} for {symbol}"))),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports(&self, _data_type: DataType) -> bool {
        true
    }

    fn max_batch_size(&self, data_type: DataType) -> Option<usize> {
        match data_type {
            DataType::Quote => Some(50),
            DataType::Profile => Some(10),
            _ => None,
        }
    }

    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, RiservaError> {
        self.answer(symbol, data_type).await
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        data_type: DataType,
    ) -> Result<BatchPayloads, RiservaError> {
        if symbols.iter().any(|s| s == "QUOTA") {
            return Err(RiservaError::quota_exceeded(self.name));
        }
        let mut out = BatchPayloads::with_capacity(symbols.len());
        for s in symbols {
            match self.answer(s, data_type).await {
                // a multi-symbol upstream silently drops unknown symbols
                Err(RiservaError::NotFound { .. }) => {}
                other => {
                    out.insert(s.clone(), other);
                }
            }
        }
        Ok(out)
    }
}
