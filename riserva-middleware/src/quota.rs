//! Quota-aware provider wrapper.
//!
//! Tracks a local unit budget over a fixed window and rejects calls with
//! `RiservaError::QuotaExceeded` before they reach the upstream once the budget
//! is spent. The resolver treats that exactly like an upstream quota signal.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use riserva_core::{BatchPayloads, DataType, Middleware, Provider, RiservaError};
use riserva_types::{QuotaConfig, QuotaConsumptionStrategy, QuotaState};
use serde_json::Value;

/// Layer name used in middleware stacks.
pub(crate) const NAME: &str = "QuotaAwareProvider";

/// Wrapper that enforces quotas.
pub struct QuotaAwareProvider {
    inner: Arc<dyn Provider>,
    config: QuotaConfig,
    runtime: Mutex<QuotaRuntime>,
}

struct QuotaRuntime {
    // window tracking
    used_in_window: u64,
    window_start: Instant,

    // even-spread slice tracking
    allowed_per_slice: u64,
    slice_duration: Duration,
    used_in_slice: u64,
    slice_start: Instant,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Advance `start` to the most recent boundary of `period` at or before `now`.
fn align(start: &mut Instant, period: Duration, now: Instant) -> bool {
    let elapsed = now.duration_since(*start);
    if period.is_zero() || elapsed < period {
        return false;
    }
    let periods = elapsed.as_nanos() / period.as_nanos();
    let offset = u64::try_from(periods * period.as_nanos()).unwrap_or(u64::MAX);
    *start += Duration::from_nanos(offset);
    true
}

impl QuotaAwareProvider {
    /// Create a new quota-aware wrapper around an existing provider.
    pub fn new(inner: Arc<dyn Provider>, config: QuotaConfig) -> Self {
        let (allowed_per_slice, slice_duration) = match config.strategy {
            QuotaConsumptionStrategy::EvenSpreadHourly => {
                // 24 slices per window; a one-day window gives hourly slices.
                let slices = 24u64;
                let per_slice = std::cmp::max(1, config.limit / slices);
                let slice_ms = std::cmp::max(1, millis(config.window) / slices);
                (per_slice, Duration::from_millis(slice_ms))
            }
            _ => (0, Duration::ZERO),
        };
        let now = Instant::now();
        Self {
            inner,
            config,
            runtime: Mutex::new(QuotaRuntime {
                used_in_window: 0,
                window_start: now,
                allowed_per_slice,
                slice_duration,
                used_in_slice: 0,
                slice_start: now,
            }),
        }
    }

    /// Access the inner provider.
    pub fn inner(&self) -> &Arc<dyn Provider> {
        &self.inner
    }

    /// Snapshot of the current budget.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn state(&self) -> QuotaState {
        let mut rt = self.runtime.lock().expect("mutex poisoned");
        let now = Instant::now();
        if align(&mut rt.window_start, self.config.window, now) {
            rt.used_in_window = 0;
        }
        QuotaState {
            limit: self.config.limit,
            remaining: self.config.limit.saturating_sub(rt.used_in_window),
            reset_in: self
                .config
                .window
                .saturating_sub(now.duration_since(rt.window_start)),
        }
    }

    /// Check whether a single-unit call should be allowed, consuming the unit if so.
    ///
    /// # Errors
    /// See [`should_allow_units`](Self::should_allow_units).
    pub fn should_allow_call(&self) -> Result<(), RiservaError> {
        self.should_allow_units(1)
    }

    /// Check whether a call costing `units` should be allowed, consuming them if so.
    ///
    /// # Errors
    /// Returns `RiservaError::QuotaExceeded` when the per-slice (for
    /// `EvenSpreadHourly`) or the overall window budget cannot cover the call.
    /// When only the slice is exhausted, `remaining` is greater than zero and
    /// `reset_in_ms` is the time until the next slice boundary.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn should_allow_units(&self, units: u64) -> Result<(), RiservaError> {
        let mut rt = self.runtime.lock().expect("mutex poisoned");
        let now = Instant::now();
        let limit = self.config.limit;
        let spread = matches!(
            self.config.strategy,
            QuotaConsumptionStrategy::EvenSpreadHourly
        );

        if align(&mut rt.window_start, self.config.window, now) {
            rt.used_in_window = 0;
        }

        if spread {
            let slice = rt.slice_duration;
            if align(&mut rt.slice_start, slice, now) {
                rt.used_in_slice = 0;
            }
            if rt.used_in_slice + units > rt.allowed_per_slice && rt.used_in_window < limit {
                let reset_in_ms = millis(slice.saturating_sub(now.duration_since(rt.slice_start)));
                return Err(RiservaError::QuotaExceeded {
                    connector: self.inner.name().to_string(),
                    remaining: limit.saturating_sub(rt.used_in_window),
                    reset_in_ms,
                });
            }
        }

        if rt.used_in_window + units <= limit {
            rt.used_in_window += units;
            if spread {
                rt.used_in_slice += units;
            }
            return Ok(());
        }

        let reset_in_ms = millis(
            self.config
                .window
                .saturating_sub(now.duration_since(rt.window_start)),
        );
        let remaining = limit.saturating_sub(rt.used_in_window);
        drop(rt);

        #[cfg(feature = "tracing")]
        tracing::warn!(
            provider = self.inner.name(),
            remaining,
            reset_in_ms,
            "local quota exhausted"
        );

        Err(RiservaError::QuotaExceeded {
            connector: self.inner.name().to_string(),
            remaining,
            reset_in_ms,
        })
    }

    fn batch_cost(&self, symbols: &[String]) -> u64 {
        match self.config.strategy {
            QuotaConsumptionStrategy::Weighted => {
                u64::try_from(symbols.len()).unwrap_or(u64::MAX).max(1)
            }
            _ => 1,
        }
    }
}

#[async_trait]
impl Provider for QuotaAwareProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    fn supports(&self, data_type: DataType) -> bool {
        self.inner.supports(data_type)
    }

    fn max_batch_size(&self, data_type: DataType) -> Option<usize> {
        self.inner.max_batch_size(data_type)
    }

    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, RiservaError> {
        self.should_allow_call()?;
        self.inner.fetch(symbol, data_type).await
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        data_type: DataType,
    ) -> Result<BatchPayloads, RiservaError> {
        self.should_allow_units(self.batch_cost(symbols))?;
        self.inner.fetch_batch(symbols, data_type).await
    }
}

/// Middleware config for constructing a [`QuotaAwareProvider`].
pub struct QuotaMiddleware {
    config: QuotaConfig,
}

impl QuotaMiddleware {
    /// Wrap providers with the given budget.
    #[must_use]
    pub const fn new(config: QuotaConfig) -> Self {
        Self { config }
    }

    pub(crate) fn strategy_label(strategy: QuotaConsumptionStrategy) -> &'static str {
        match strategy {
            QuotaConsumptionStrategy::EvenSpreadHourly => "EvenSpreadHourly",
            QuotaConsumptionStrategy::Weighted => "Weighted",
            _ => "Unit",
        }
    }

    pub(crate) fn parse_strategy(label: Option<&str>) -> QuotaConsumptionStrategy {
        match label {
            Some("EvenSpreadHourly") => QuotaConsumptionStrategy::EvenSpreadHourly,
            Some("Weighted") => QuotaConsumptionStrategy::Weighted,
            _ => QuotaConsumptionStrategy::Unit,
        }
    }
}

impl Middleware for QuotaMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        Arc::new(QuotaAwareProvider::new(inner, self.config))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn config_json(&self) -> Value {
        serde_json::json!({
            "limit": self.config.limit,
            "window_ms": millis(self.config.window),
            "strategy": Self::strategy_label(self.config.strategy),
        })
    }
}
