//! Builder for composing providers with middleware layers.
//!
//! Layers form an onion around the raw provider:
//!
//! ```text
//! Resolver
//!     ↓
//! BlacklistingProvider (checks first, observes quota errors last)
//!     ↓
//! QuotaAwareProvider (spends the local budget)
//!     ↓
//! Raw provider (makes the upstream call)
//! ```
//!
//! `layers` is kept outermost-first, matching [`MiddlewareStack`], and applied in
//! reverse during [`ProviderBuilder::build`].

use std::sync::Arc;
use std::time::Duration;

use riserva_core::{Middleware, Provider, RiservaError};
use riserva_types::{MiddlewareLayer, MiddlewareStack, QuotaConfig, QuotaConsumptionStrategy};
use serde_json::{Value, json};

use crate::blacklist::{self, BlacklistMiddleware};
use crate::quota::{self, QuotaMiddleware};

const RAW_LAYER: &str = "RawProvider";
const DEFAULT_BLACKLIST_MS: u64 = 300_000;

/// Generic middleware builder for composing a provider with layered wrappers.
pub struct ProviderBuilder {
    raw: Arc<dyn Provider>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl ProviderBuilder {
    /// Create a new builder from a raw, unwrapped provider.
    #[must_use]
    pub fn new(raw: Arc<dyn Provider>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    fn existing_quota_config(&self) -> Option<QuotaConfig> {
        self.layers
            .iter()
            .find(|l| l.name() == quota::NAME)
            .map(|l| quota_config_from_json(&l.config_json()))
    }

    /// Add or replace the quota layer, placing it outermost.
    #[must_use]
    pub fn with_quota(mut self, cfg: &QuotaConfig) -> Self {
        self.layers.retain(|m| m.name() != quota::NAME);
        self.layers
            .insert(0, Box::new(QuotaMiddleware::new(cfg.clone())));
        self
    }

    /// Remove quota if present.
    #[must_use]
    pub fn without_quota(mut self) -> Self {
        self.layers.retain(|m| m.name() != quota::NAME);
        self
    }

    /// Add or replace the blacklist layer, placing it outermost.
    #[must_use]
    pub fn with_blacklist(mut self, duration: Duration) -> Self {
        self.layers.retain(|m| m.name() != blacklist::NAME);
        self.layers
            .insert(0, Box::new(BlacklistMiddleware::new(duration)));
        self
    }

    /// Remove blacklist if present.
    #[must_use]
    pub fn without_blacklist(mut self) -> Self {
        self.layers.retain(|m| m.name() != blacklist::NAME);
        self
    }

    /// Shortcut: set quota limit only (preserves existing window/strategy if already set).
    #[must_use]
    pub fn quota_limit(self, limit: u64) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.limit = limit;
        self.with_quota(&cfg)
    }

    /// Shortcut: set window (preserves existing limit/strategy if already set).
    #[must_use]
    pub fn quota_window(self, window: Duration) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.window = window;
        self.with_quota(&cfg)
    }

    /// Shortcut: set strategy (preserves existing limit/window if already set).
    #[must_use]
    pub fn quota_strategy(self, strategy: QuotaConsumptionStrategy) -> Self {
        let mut cfg = self.existing_quota_config().unwrap_or_default();
        cfg.strategy = strategy;
        self.with_quota(&cfg)
    }

    /// Add an arbitrary middleware layer at the outermost position.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Export the current middleware stack, outermost first.
    ///
    /// The raw provider is appended as the innermost layer for observability.
    #[must_use]
    pub fn to_stack(&self) -> MiddlewareStack {
        let mut stack = MiddlewareStack::new();
        for layer in &self.layers {
            stack.push_inner(MiddlewareLayer::new(layer.name(), layer.config_json()));
        }
        stack.push_inner(MiddlewareLayer::new(
            RAW_LAYER,
            json!({ "name": self.raw.name() }),
        ));
        stack
    }

    /// Rebuild a builder from a raw provider and an exported stack.
    ///
    /// This is the inverse of [`to_stack`](Self::to_stack).
    ///
    /// # Errors
    /// Returns `InvalidMiddlewareStack` for unknown layer names, a quota layer
    /// with a zero limit or window, or a raw layer naming a different provider.
    pub fn from_stack(raw: Arc<dyn Provider>, stack: &MiddlewareStack) -> Result<Self, RiservaError> {
        let mut layers: Vec<Box<dyn Middleware>> = Vec::new();
        for l in &stack.layers {
            match l.name.as_str() {
                quota::NAME => {
                    let cfg = quota_config_from_json(&l.config);
                    if cfg.limit == 0 || cfg.window.is_zero() {
                        return Err(RiservaError::InvalidMiddlewareStack {
                            message: format!("{} requires a positive limit and window", quota::NAME),
                        });
                    }
                    layers.push(Box::new(QuotaMiddleware::new(cfg)));
                }
                blacklist::NAME => {
                    let dur_ms = l
                        .config
                        .get("default_duration_ms")
                        .and_then(Value::as_u64)
                        .unwrap_or(DEFAULT_BLACKLIST_MS);
                    layers.push(Box::new(BlacklistMiddleware::new(Duration::from_millis(
                        dur_ms,
                    ))));
                }
                RAW_LAYER => {
                    let named = l.config.get("name").and_then(Value::as_str);
                    if let Some(n) = named
                        && n != raw.name()
                    {
                        return Err(RiservaError::InvalidMiddlewareStack {
                            message: format!(
                                "stack was exported for {n}, not {}",
                                raw.name()
                            ),
                        });
                    }
                }
                other => {
                    return Err(RiservaError::InvalidMiddlewareStack {
                        message: format!("unknown layer: {other}"),
                    });
                }
            }
        }
        Ok(Self { raw, layers })
    }

    /// Build the wrapped provider.
    ///
    /// With `layers = [Blacklist, Quota]` the result is `Blacklist(Quota(Raw))`.
    #[must_use]
    pub fn build(self) -> Arc<dyn Provider> {
        let mut acc: Arc<dyn Provider> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}

fn quota_config_from_json(cfg: &Value) -> QuotaConfig {
    let defaults = QuotaConfig::default();
    let limit = cfg
        .get("limit")
        .and_then(Value::as_u64)
        .unwrap_or(defaults.limit);
    let window = cfg
        .get("window_ms")
        .and_then(Value::as_u64)
        .map_or(defaults.window, Duration::from_millis);
    let strategy = QuotaMiddleware::parse_strategy(cfg.get("strategy").and_then(Value::as_str));
    QuotaConfig {
        limit,
        window,
        strategy,
    }
}
