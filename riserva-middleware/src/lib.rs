//! riserva-middleware
//!
//! Provider wrappers that keep an upstream within its budget:
//!
//! - [`QuotaAwareProvider`] spends a local unit budget and fails with
//!   `QuotaExceeded` before the upstream does.
//! - [`BlacklistingProvider`] suspends a provider after a quota error until its
//!   reset time, failing fast with `TemporarilyBlacklisted`.
//! - [`ProviderBuilder`] composes both and round-trips the composition through a
//!   serializable `MiddlewareStack`.

mod blacklist;
mod builder;
mod quota;

pub use crate::blacklist::{BlacklistMiddleware, BlacklistingProvider};
pub use crate::builder::ProviderBuilder;
pub use crate::quota::{QuotaAwareProvider, QuotaMiddleware};
