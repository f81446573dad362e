
#[allow(unused_imports)]
pub use providers::{GaugeProvider, PanickingProvider};
#[allow(unused_imports)]
pub use stores::FailingStore;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use riserva::{CacheEntry, CacheKey, DataType, Provider, ProviderKey, Riserva, Source};
use riserva_mock::{DynamicMockController, DynamicMockProvider};
use serde_json::{Value, json};

// ---------- Lightweight fixtures and helpers for tests ----------

/// Common symbol constants used across tests.
pub const AAPL: &str = "AAPL";
pub const MSFT: &str = "MSFT";
pub const NVDA: &str = "NVDA";
#[allow(dead_code)]
pub const TSLA: &str = "TSLA";
#[allow(dead_code)]
pub const GOOGL: &str = "GOOGL";

/// Scripted provider serving `data_types`, one call per symbol.
pub fn scripted(name: &'static str, data_types: &[DataType]) -> (Arc<dyn Provider>, DynamicMockController) {
    let (p, ctl) = DynamicMockProvider::new(name, data_types);
    let p: Arc<dyn Provider> = p;
    (p, ctl)
}

/// Scripted provider with native multi-symbol calls of at most `max` symbols.
#[allow(dead_code)]
pub fn scripted_batching(
    name: &'static str,
    data_type: DataType,
    max: usize,
) -> (Arc<dyn Provider>, DynamicMockController) {
    let (p, ctl) = DynamicMockProvider::with_batching(name, &[data_type], &[(data_type, max)]);
    let p: Arc<dyn Provider> = p;
    (p, ctl)
}

/// Minimal normalized quote payload.
pub fn quote(symbol: &str, price: f64) -> Value {
    json!({ "symbol": symbol, "price": price })
}

/// Write an entry `age` old, attributed to provider `from`, into the orchestrator's store.
#[allow(dead_code)]
pub async fn seed(
    riserva: &Riserva,
    from: &'static str,
    symbol: &str,
    data_type: DataType,
    payload: Value,
    age: Duration,
) -> CacheEntry {
    let key = CacheKey::new(symbol, data_type).expect("valid test symbol");
    let at = Utc::now() - chrono::Duration::from_std(age).expect("test age fits");
    let entry = CacheEntry::at(key, payload, Source::Provider(ProviderKey::new(from)), at);
    riserva
        .store()
        .put(entry.clone())
        .await
        .expect("memory store accepts writes");
    entry
}

/// Read the current entry for a key.
#[allow(dead_code)]
pub async fn cached(riserva: &Riserva, symbol: &str, data_type: DataType) -> Option<CacheEntry> {
    let key = CacheKey::new(symbol, data_type).expect("valid test symbol");
    riserva.store().get(&key).await.expect("memory store reads")
}
