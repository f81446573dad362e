use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use riserva_core::{BatchPayloads, DataType, Middleware, Provider, RiservaError};
use serde_json::Value;

/// Layer name used in middleware stacks.
pub(crate) const NAME: &str = "BlacklistingProvider";

/// Middleware that blacklists its inner provider for a period upon quota exhaustion.
///
/// While blacklisted, calls fail fast with `TemporarilyBlacklisted`, which the
/// resolver treats as a transient failure and moves on to the next provider.
pub struct BlacklistingProvider {
    inner: Arc<dyn Provider>,
    state: Mutex<Option<Instant>>, // blacklist-until; None means active
    default_duration: Duration,
}

impl BlacklistingProvider {
    /// Wrap `inner`; `default_duration` applies when a quota error carries no reset time.
    pub fn new(inner: Arc<dyn Provider>, default_duration: Duration) -> Self {
        Self {
            inner,
            state: Mutex::new(None),
            default_duration,
        }
    }

    /// Time left on the blacklist, if any.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn blacklisted_for(&self) -> Option<Duration> {
        let mut guard = self.state.lock().expect("mutex poisoned");
        let now = Instant::now();
        if let Some(until) = *guard {
            if now < until {
                return Some(until - now);
            }
            // expired
            *guard = None;
        }
        None
    }

    fn blacklist_until(&self, until: Instant) {
        let mut guard = self.state.lock().expect("mutex poisoned");
        *guard = Some(until);
    }

    fn check(&self) -> Result<(), RiservaError> {
        match self.blacklisted_for() {
            Some(left) => Err(RiservaError::TemporarilyBlacklisted {
                connector: self.inner.name().to_string(),
                reset_in_ms: u64::try_from(left.as_millis()).unwrap_or(u64::MAX),
            }),
            None => Ok(()),
        }
    }

    fn observe(&self, err: &RiservaError) {
        if let RiservaError::QuotaExceeded {
            remaining,
            reset_in_ms,
            ..
        } = *err
        {
            // Only full exhaustion (remaining == 0) earns the long blacklist.
            let duration = if remaining == 0 {
                if reset_in_ms > 0 {
                    Duration::from_millis(reset_in_ms)
                } else {
                    self.default_duration
                }
            } else {
                Duration::from_millis(reset_in_ms.max(1))
            };

            #[cfg(feature = "tracing")]
            tracing::warn!(
                provider = self.inner.name(),
                blacklist_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "provider blacklisted after quota exhaustion"
            );

            self.blacklist_until(Instant::now() + duration);
        }
    }
}

#[async_trait]
impl Provider for BlacklistingProvider {
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
        self.check()?;
        let res = self.inner.fetch(symbol, data_type).await;
        if let Err(e) = &res {
            self.observe(e);
        }
        res
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        data_type: DataType,
    ) -> Result<BatchPayloads, RiservaError> {
        self.check()?;
        let res = self.inner.fetch_batch(symbols, data_type).await;
        match &res {
            Err(e) => self.observe(e),
            Ok(map) => {
                if let Some(Err(e)) = map.values().find(|r| matches!(r, Err(e) if e.is_quota())) {
                    self.observe(e);
                }
            }
        }
        res
    }
}

/// Middleware config for constructing a [`BlacklistingProvider`].
pub struct BlacklistMiddleware {
    default_duration: Duration,
}

impl BlacklistMiddleware {
    /// Blacklist for `default_duration` when the quota error carries no reset time.
    #[must_use]
    pub const fn new(default_duration: Duration) -> Self {
        Self { default_duration }
    }
}

impl Middleware for BlacklistMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        Arc::new(BlacklistingProvider::new(inner, self.default_duration))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn config_json(&self) -> Value {
        serde_json::json!({
            "default_duration_ms": u64::try_from(self.default_duration.as_millis()).unwrap_or(u64::MAX),
        })
    }
}
