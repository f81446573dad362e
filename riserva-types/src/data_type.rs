use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RiservaError;

/// Category of market data a caller can request for a symbol.
///
/// Identifiers are stable and lowercase; they are used as configuration keys,
/// cache key components and labels in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Point-in-time quote.
    Quote,
    /// Company profile.
    Profile,
    /// Valuation and profitability ratios.
    Ratios,
    /// Recent news articles.
    News,
    /// Daily OHLCV bars.
    Prices,
    /// Analyst recommendations and price targets.
    Analyst,
    /// Earnings calendar and history.
    Earnings,
    /// Sector composition.
    Sector,
}

impl DataType {
    /// Every data type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Quote,
        Self::Profile,
        Self::Ratios,
        Self::News,
        Self::Prices,
        Self::Analyst,
        Self::Earnings,
        Self::Sector,
    ];

    /// Stable, lowercase identifier for logs/errors/config.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Profile => "profile",
            Self::Ratios => "ratios",
            Self::News => "news",
            Self::Prices => "prices",
            Self::Analyst => "analyst",
            Self::Earnings => "earnings",
            Self::Sector => "sector",
        }
    }

    /// Freshness threshold applied when no TTL is configured.
    ///
    /// Quotes go stale after 15 minutes, prices and news after an hour, and the
    /// slow-moving fundamentals after a day.
    #[must_use]
    pub const fn default_ttl(self) -> Duration {
        match self {
            Self::Quote => Duration::from_secs(15 * 60),
            Self::Prices | Self::News => Duration::from_secs(60 * 60),
            Self::Profile | Self::Ratios | Self::Analyst | Self::Earnings | Self::Sector => {
                Duration::from_secs(24 * 60 * 60)
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = RiservaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|dt| dt.as_str() == needle)
            .ok_or_else(|| RiservaError::UnknownDataType {
                data_type: s.to_string(),
            })
    }
}
