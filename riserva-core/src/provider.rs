use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{DataType, ProviderKey, RiservaError};

/// Per-symbol results of a multi-symbol call, keyed by normalized symbol.
pub type BatchPayloads = HashMap<String, Result<Value, RiservaError>>;

/// An upstream source of market data.
///
/// A provider owns the request builder and response normalizer for every data
/// type it supports; callers only ever see normalized JSON payloads and
/// classified [`RiservaError`]s.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A stable identifier used in chain configuration (e.g. "fmp", "alpha-vantage").
    fn name(&self) -> &'static str;

    /// Canonical provider key constructed from the static name.
    fn key(&self) -> ProviderKey {
        ProviderKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Whether this provider can serve `data_type`.
    fn supports(&self, data_type: DataType) -> bool;

    /// Maximum symbols per native multi-symbol call for `data_type`.
    ///
    /// `None` means the provider has no multi-symbol endpoint for this data
    /// type and callers should issue one `fetch` per symbol.
    fn max_batch_size(&self, data_type: DataType) -> Option<usize> {
        let _ = data_type;
        None
    }

    /// Fetch and normalize one symbol.
    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, RiservaError>;

    /// Fetch and normalize several symbols in a single upstream call.
    ///
    /// An `Err` means the call failed as a whole and applies to every symbol.
    /// An `Ok` map may omit symbols; callers treat missing symbols as not found.
    ///
    /// The default implementation issues one `fetch` per symbol, sequentially.
    async fn fetch_batch(
        &self,
        symbols: &[String],
        data_type: DataType,
    ) -> Result<BatchPayloads, RiservaError> {
        let mut out = BatchPayloads::with_capacity(symbols.len());
        for s in symbols {
            let r = self.fetch(s, data_type).await;
            out.insert(s.clone(), r);
        }
        Ok(out)
    }
}
