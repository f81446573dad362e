//! Middleware trait for wrapping `Provider` implementations.

use std::sync::Arc;

use crate::Provider;

/// Trait implemented by provider middleware layers.
///
/// A middleware consumes an inner `Provider` and returns a wrapped provider
/// that augments or restricts behavior (e.g., quotas, blacklisting).
pub trait Middleware: Send + Sync {
    /// Apply this middleware to wrap an inner provider and return the wrapped provider.
    fn apply(self: Box<Self>, inner: Arc<dyn Provider>) -> Arc<dyn Provider>;

    /// Middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}
