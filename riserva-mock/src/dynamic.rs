//! Provider whose behavior is scripted at runtime by a controller handle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use riserva_core::{BatchPayloads, DataType, Provider, RiservaError};

/// Instruction for how a call should behave for a given input.
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return the provided payload immediately.
    Return(Value),
    /// Fail immediately with the provided error.
    Fail(RiservaError),
    /// Hang indefinitely (simulate a timeout).
    Hang,
}

#[derive(Default)]
struct InternalState {
    rules: HashMap<(DataType, String), MockBehavior>,
    defaults: HashMap<DataType, MockBehavior>,
    batch_failure: HashMap<DataType, RiservaError>,
    fetch_log: Vec<(DataType, String)>,
    batch_log: Vec<(DataType, Vec<String>)>,
}

impl InternalState {
    fn behavior(&self, data_type: DataType, symbol: &str) -> Option<MockBehavior> {
        self.rules
            .get(&(data_type, symbol.to_string()))
            .or_else(|| self.defaults.get(&data_type))
            .cloned()
    }
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
#[derive(Clone)]
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for one symbol and data type.
    pub async fn set(&self, data_type: DataType, symbol: &str, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert((data_type, symbol.to_string()), behavior);
    }

    /// Set the behavior for every symbol of a data type without a specific rule.
    pub async fn set_default(&self, data_type: DataType, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.defaults.insert(data_type, behavior);
    }

    /// Make multi-symbol calls for `data_type` fail as a whole.
    pub async fn fail_batches(&self, data_type: DataType, error: RiservaError) {
        let mut guard = self.state.lock().await;
        guard.batch_failure.insert(data_type, error);
    }

    /// Number of upstream calls made (single and multi-symbol).
    pub async fn calls(&self) -> usize {
        let guard = self.state.lock().await;
        guard.fetch_log.len() + guard.batch_log.len()
    }

    /// Number of single-symbol calls made for `symbol`.
    pub async fn fetches_for(&self, symbol: &str) -> usize {
        let guard = self.state.lock().await;
        guard.fetch_log.iter().filter(|(_, s)| s == symbol).count()
    }

    /// Symbol lists of every multi-symbol call, in call order.
    pub async fn batch_requests(&self) -> Vec<Vec<String>> {
        let guard = self.state.lock().await;
        guard.batch_log.iter().map(|(_, s)| s.clone()).collect()
    }

    /// Clear all configured behaviors and call logs.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        *guard = InternalState::default();
    }
}

/// A provider that defers all behavior to an external controller.
///
/// Symbols without a rule or default are not found (and are omitted from
/// multi-symbol responses).
pub struct DynamicMockProvider {
    name: &'static str,
    data_types: Vec<DataType>,
    batch_sizes: HashMap<DataType, usize>,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockProvider {
    /// Create a provider serving `data_types` and its controller.
    #[must_use]
    pub fn new(name: &'static str, data_types: &[DataType]) -> (Arc<Self>, DynamicMockController) {
        Self::with_batching(name, data_types, &[])
    }

    /// Like [`new`](Self::new), with native multi-symbol support for some data types.
    #[must_use]
    pub fn with_batching(
        name: &'static str,
        data_types: &[DataType],
        batch_sizes: &[(DataType, usize)],
    ) -> (Arc<Self>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let provider = Arc::new(Self {
            name,
            data_types: data_types.to_vec(),
            batch_sizes: batch_sizes.iter().copied().collect(),
            state: Arc::clone(&state),
        });
        (provider, DynamicMockController { state })
    }

    async fn run(behavior: Option<MockBehavior>, what: String) -> Result<Value, RiservaError> {
        match behavior {
            Some(MockBehavior::Return(v)) => Ok(v),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => Err(RiservaError::not_found(what)),
        }
    }
}

#[async_trait]
impl Provider for DynamicMockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    fn supports(&self, data_type: DataType) -> bool {
        self.data_types.contains(&data_type)
    }

    fn max_batch_size(&self, data_type: DataType) -> Option<usize> {
        self.batch_sizes.get(&data_type).copied()
    }

    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, RiservaError> {
        // Release the lock before awaiting the behavior (Hang never returns).
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.fetch_log.push((data_type, symbol.to_string()));
            guard.behavior(data_type, symbol)
        };
        Self::run(behavior, format!("{data_type} for {symbol}")).await
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        data_type: DataType,
    ) -> Result<BatchPayloads, RiservaError> {
        let (failure, behaviors) = {
            let mut guard = self.state.lock().await;
            guard.batch_log.push((data_type, symbols.to_vec()));
            let failure = guard.batch_failure.get(&data_type).cloned();
            let behaviors: Vec<(String, Option<MockBehavior>)> = symbols
                .iter()
                .map(|s| (s.clone(), guard.behavior(data_type, s)))
                .collect();
            (failure, behaviors)
        };
        if let Some(e) = failure {
            return Err(e);
        }
        let mut out = BatchPayloads::with_capacity(behaviors.len());
        for (symbol, behavior) in behaviors {
            match behavior {
                None => {}
                Some(MockBehavior::Hang) => std::future::pending::<()>().await,
                Some(MockBehavior::Return(v)) => {
                    out.insert(symbol, Ok(v));
                }
                Some(MockBehavior::Fail(e)) => {
                    out.insert(symbol, Err(e));
                }
            }
        }
        Ok(out)
    }
}
