use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outcome::FetchStatus;

/// Unified error type for the riserva workspace.
///
/// Covers configuration mistakes detected at build or request time, provider-tagged
/// failures, quota exhaustion, not-found conditions, and an aggregate for
/// multi-provider attempts. Every variant maps to exactly one [`FetchStatus`]
/// through [`RiservaError::status`].
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RiservaError {
    /// The requested data type has no registry entry.
    #[error("unknown data type: {data_type}")]
    UnknownDataType {
        /// Identifier that failed to resolve.
        data_type: String,
    },

    /// The data type is registered but its provider chain is empty.
    #[error("empty provider chain for data type: {data_type}")]
    EmptyProviderChain {
        /// Data type whose chain is empty.
        data_type: String,
    },

    /// A configured provider key does not match any registered provider.
    #[error("unknown provider: {provider}")]
    UnknownProvider {
        /// Provider key as written in configuration.
        provider: String,
    },

    /// Other configuration inconsistencies (provider does not serve a data type, etc.).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Issues with the returned or expected data (empty or malformed payloads).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// An individual provider returned a transient failure.
    #[error("{connector} failed: {msg}")]
    Connector {
        /// Provider name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),

    /// A resource or symbol could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of missing resource, e.g. "quote for AAPL".
        what: String,
    },

    /// All providers in the chain failed; contains the individual failures.
    #[error("all providers failed: {0:?}")]
    AllProvidersFailed(Vec<RiservaError>),

    /// An individual provider call exceeded the configured timeout.
    #[error("provider timed out: {data_type} via {connector}")]
    ProviderTimeout {
        /// Provider name that timed out.
        connector: String,
        /// Data type label (e.g. "quote", "profile").
        data_type: String,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {data_type}")]
    RequestTimeout {
        /// Data type label for which the request timed out.
        data_type: String,
    },

    /// All attempted providers timed out for the requested data type.
    #[error("all providers timed out: {data_type}")]
    AllProvidersTimedOut {
        /// Data type label that timed out across all providers.
        data_type: String,
    },

    /// The provider reported (or a local budget detected) an exhausted quota.
    #[error("quota exceeded for {connector}: remaining={remaining} reset_in_ms={reset_in_ms}")]
    QuotaExceeded {
        /// Provider whose quota is exhausted.
        connector: String,
        /// Remaining units at the time of rejection.
        remaining: u64,
        /// Milliseconds until the quota window resets (0 when unknown).
        reset_in_ms: u64,
    },

    /// The request rate exceeds the configured rate limit.
    #[error("rate limit exceeded: limit={limit} window_ms={window_ms}")]
    RateLimitExceeded {
        /// Allowed number of requests or units in the window.
        limit: u64,
        /// Window length in milliseconds.
        window_ms: u64,
    },

    /// Provider is temporarily blacklisted by middleware; retry after `reset_in_ms`.
    #[error("{connector} temporarily blacklisted: reset_in_ms={reset_in_ms}")]
    TemporarilyBlacklisted {
        /// Provider that is blacklisted.
        connector: String,
        /// Milliseconds remaining until the blacklist window elapses.
        reset_in_ms: u64,
    },

    /// The cache store could not be read or written.
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// Middleware stack configuration is invalid (unknown layer, malformed config, etc.).
    #[error("invalid middleware stack: {message}")]
    InvalidMiddlewareStack {
        /// Human-readable description of the validation failure.
        message: String,
    },
}

impl RiservaError {
    /// Helper: build a `Connector` error with the provider name and message.
    pub fn connector(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connector {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
            data_type: data_type.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(data_type: impl Into<String>) -> Self {
        Self::RequestTimeout {
            data_type: data_type.into(),
        }
    }

    /// Helper: build a `QuotaExceeded` error for an upstream whose limits are unknown.
    pub fn quota_exceeded(connector: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            connector: connector.into(),
            remaining: 0,
            reset_in_ms: 0,
        }
    }

    /// Classify this error into the fetch status it represents.
    ///
    /// - quota and rate-limit exhaustion map to [`FetchStatus::QuotaExceeded`];
    /// - not-found, data and argument problems (and configuration errors) are
    ///   [`FetchStatus::PermanentError`];
    /// - aggregates report quota if any member did, permanent if every member was
    ///   permanent, and transient otherwise;
    /// - everything else, including timeouts and blacklisting, is transient.
    #[must_use]
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::QuotaExceeded { .. } | Self::RateLimitExceeded { .. } => {
                FetchStatus::QuotaExceeded
            }
            Self::NotFound { .. }
            | Self::Data(_)
            | Self::InvalidArg(_)
            | Self::UnknownDataType { .. }
            | Self::EmptyProviderChain { .. }
            | Self::UnknownProvider { .. }
            | Self::Configuration(_)
            | Self::InvalidMiddlewareStack { .. } => FetchStatus::PermanentError,
            Self::AllProvidersFailed(inner) => {
                let statuses: Vec<FetchStatus> = inner.iter().map(Self::status).collect();
                if statuses.contains(&FetchStatus::QuotaExceeded) {
                    FetchStatus::QuotaExceeded
                } else if !statuses.is_empty()
                    && statuses.iter().all(|s| *s == FetchStatus::PermanentError)
                {
                    FetchStatus::PermanentError
                } else {
                    FetchStatus::TransientError
                }
            }
            _ => FetchStatus::TransientError,
        }
    }

    /// True for quota-exceeded errors (directly or inside an aggregate).
    #[must_use]
    pub fn is_quota(&self) -> bool {
        self.status() == FetchStatus::QuotaExceeded
    }

    /// True for permanent errors that retrying the same provider will not fix.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.status() == FetchStatus::PermanentError
    }

    /// True for configuration errors that fail a request before any provider is contacted.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownDataType { .. }
                | Self::EmptyProviderChain { .. }
                | Self::UnknownProvider { .. }
                | Self::Configuration(_)
                | Self::InvalidMiddlewareStack { .. }
        )
    }

    /// Flatten nested `AllProvidersFailed` structures into a plain vector.
    ///
    /// This preserves other error variants as-is and unwraps recursively.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllProvidersFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

impl From<serde_json::Error> for RiservaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Data(e.to_string())
    }
}
