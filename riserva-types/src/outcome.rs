//! Per-request results: fetch status, single-key resolutions and per-symbol outcomes.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CacheKey, RiservaError, Source};

/// Result classification of a single provider attempt or batch cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStatus {
    /// A payload was produced.
    Ok,
    /// Timeout, network or 5xx-style failure; another provider may succeed.
    TransientError,
    /// Provider signalled rate or quota exhaustion; stop calling providers.
    QuotaExceeded,
    /// Malformed request, unknown symbol or unparseable body.
    PermanentError,
}

impl FetchStatus {
    /// Stable, kebab-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::TransientError => "transient-error",
            Self::QuotaExceeded => "quota-exceeded",
            Self::PermanentError => "permanent-error",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one `(symbol, data_type)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Key that was resolved.
    pub key: CacheKey,
    /// Normalized payload.
    pub payload: serde_json::Value,
    /// Where the payload came from.
    pub source: Source,
    /// True when the payload is older than the data type's TTL or synthetic.
    pub stale: bool,
    /// Timestamp of the underlying value; `None` for synthetic payloads.
    pub last_updated: Option<DateTime<Utc>>,
    /// Provider failures encountered before this payload was produced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RiservaError>,
}

impl Resolution {
    /// True when the caller received a stale cache value or a synthetic payload.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.stale || self.source == Source::Synthetic
    }
}

/// Per-symbol outcome inside a batch result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Classification of the outcome.
    pub status: FetchStatus,
    /// Payload, present only when `status` is `Ok`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Origin of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// True when a stale or synthetic value was served.
    #[serde(default)]
    pub stale: bool,
    /// Timestamp of the underlying value, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Error describing why no payload is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RiservaError>,
}

impl FetchOutcome {
    /// Successful outcome.
    #[must_use]
    pub const fn ok(
        payload: serde_json::Value,
        source: Source,
        stale: bool,
        last_updated: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status: FetchStatus::Ok,
            payload: Some(payload),
            source: Some(source),
            stale,
            last_updated,
            error: None,
        }
    }

    /// Failed outcome, classified from the error.
    #[must_use]
    pub fn failed(error: RiservaError) -> Self {
        Self {
            status: error.status(),
            payload: None,
            source: None,
            stale: false,
            last_updated: None,
            error: Some(error),
        }
    }

    /// True when a payload is present.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }
}

impl From<Resolution> for FetchOutcome {
    fn from(r: Resolution) -> Self {
        Self::ok(r.payload, r.source, r.stale, r.last_updated)
    }
}

impl From<Result<Resolution, RiservaError>> for FetchOutcome {
    fn from(r: Result<Resolution, RiservaError>) -> Self {
        match r {
            Ok(res) => res.into(),
            Err(e) => Self::failed(e),
        }
    }
}
