//! riserva-http
//!
//! Generic HTTP provider for the riserva resolver. An [`HttpProvider`] serves one
//! upstream API: each data type maps to an [`Endpoint`] (a path and query
//! template plus a normalizer into the canonical payload), requests carry the
//! configured [`Auth`], and every response goes through the vendor's
//! [`ErrorRules`] so that quota signals, unknown symbols and outages are told
//! apart before any payload reaches the cache.
//!
//! Ready-made configurations for the upstreams the resolver was built around
//! live in [`presets`].
#![warn(missing_docs)]

/// Request authentication.
pub mod auth;
/// Middleware shortcuts for HTTP providers.
pub mod builder;
/// Endpoint templates.
pub mod endpoint;
/// Normalizers from vendor responses into canonical payloads.
pub mod normalize;
/// Vendor presets.
pub mod presets;
/// The provider and its builder.
pub mod provider;
/// Response classification.
pub mod rules;

pub use auth::Auth;
pub use endpoint::{Endpoint, Normalizer, Splitter, split_by_symbol};
pub use provider::{HttpProvider, HttpProviderBuilder};
pub use rules::ErrorRules;
