//! Preconfigured builders for the supported upstreams.
//!
//! Each function returns an [`HttpProviderBuilder`] with the vendor's base URL,
//! authentication, error rules, endpoints and free-plan budget filled in. Call
//! `.base_url(..)` to point at a proxy or a test server before `.build()`.

use std::time::Duration;

use riserva_core::DataType;
use riserva_types::{QuotaConfig, QuotaConsumptionStrategy};

use crate::auth::Auth;
use crate::endpoint::{Endpoint, Normalizer};
use crate::normalize::{alpha_vantage as av, finnhub as fh, fmp as fm, marketaux as mx};
use crate::provider::{HttpProvider, HttpProviderBuilder};
use crate::rules::ErrorRules;

/// Provider name of the FMP preset.
pub const FMP: &str = "fmp";
/// Provider name of the Alpha Vantage preset.
pub const ALPHA_VANTAGE: &str = "alpha-vantage";
/// Provider name of the Finnhub preset.
pub const FINNHUB: &str = "finnhub";
/// Provider name of the Marketaux preset.
pub const MARKETAUX: &str = "marketaux";

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Financial Modeling Prep (`/api/v3`).
///
/// Quotes and profiles use the native comma-separated multi-symbol endpoints
/// (50 and 10 symbols per call).
#[must_use]
pub fn fmp(api_key: impl Into<String>) -> HttpProviderBuilder {
    HttpProvider::builder(FMP)
        .vendor("Financial Modeling Prep")
        .base_url("https://financialmodelingprep.com/api/v3")
        .auth(Auth::query("apikey", api_key))
        .rules(ErrorRules::fmp(FMP))
        .endpoint(
            DataType::Quote,
            Endpoint::new("/quote/{symbols}", fm::quote).batched(50),
        )
        .endpoint(
            DataType::Profile,
            Endpoint::new("/profile/{symbols}", fm::profile).batched(10),
        )
        .endpoint(
            DataType::Ratios,
            Endpoint::new("/ratios-ttm/{symbol}", fm::ratios),
        )
        .endpoint(
            DataType::Prices,
            Endpoint::new("/historical-price-full/{symbol}", fm::prices).query("timeseries", "30"),
        )
        .endpoint(
            DataType::News,
            Endpoint::new("/stock_news", fm::news)
                .query("tickers", "{symbol}")
                .query("limit", "20"),
        )
        .endpoint(
            DataType::Analyst,
            Endpoint::new("/analyst-stock-recommendations/{symbol}", fm::analyst),
        )
        .endpoint(
            DataType::Earnings,
            Endpoint::new("/historical/earning_calendar/{symbol}", fm::earnings),
        )
        .quota(QuotaConfig {
            limit: 250,
            window: DAY,
            strategy: QuotaConsumptionStrategy::Unit,
        })
}

/// Alpha Vantage (`/query?function=...`). The free plan allows 25 calls a day.
#[must_use]
pub fn alpha_vantage(api_key: impl Into<String>) -> HttpProviderBuilder {
    let function = |f: &str, n: Normalizer| Endpoint::new("/query", n).query("function", f);
    HttpProvider::builder(ALPHA_VANTAGE)
        .vendor("Alpha Vantage")
        .base_url("https://www.alphavantage.co")
        .auth(Auth::query("apikey", api_key))
        .rules(ErrorRules::alpha_vantage(ALPHA_VANTAGE))
        .endpoint(
            DataType::Quote,
            function("GLOBAL_QUOTE", av::quote).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Prices,
            function("TIME_SERIES_DAILY", av::prices).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Profile,
            function("OVERVIEW", av::profile).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Ratios,
            function("OVERVIEW", av::ratios).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::News,
            function("NEWS_SENTIMENT", av::news)
                .query("tickers", "{symbol}")
                .query("limit", "20"),
        )
        .endpoint(
            DataType::Earnings,
            function("EARNINGS", av::earnings).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Sector,
            function("ETF_PROFILE", av::sector).query("symbol", "{symbol}"),
        )
        .quota(QuotaConfig {
            limit: 25,
            window: DAY,
            strategy: QuotaConsumptionStrategy::EvenSpreadHourly,
        })
}

/// Finnhub (`/api/v1`). The free plan allows 60 calls a minute.
#[must_use]
pub fn finnhub(api_key: impl Into<String>) -> HttpProviderBuilder {
    HttpProvider::builder(FINNHUB)
        .vendor("Finnhub")
        .base_url("https://finnhub.io/api/v1")
        .auth(Auth::header("X-Finnhub-Token", api_key))
        .rules(ErrorRules::finnhub(FINNHUB))
        .endpoint(
            DataType::Quote,
            Endpoint::new("/quote", fh::quote).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Profile,
            Endpoint::new("/stock/profile2", fh::profile).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Ratios,
            Endpoint::new("/stock/metric", fh::ratios)
                .query("symbol", "{symbol}")
                .query("metric", "all"),
        )
        .endpoint(
            DataType::Analyst,
            Endpoint::new("/stock/recommendation", fh::analyst).query("symbol", "{symbol}"),
        )
        .endpoint(
            DataType::Earnings,
            Endpoint::new("/stock/earnings", fh::earnings).query("symbol", "{symbol}"),
        )
        .quota(QuotaConfig {
            limit: 60,
            window: Duration::from_secs(60),
            strategy: QuotaConsumptionStrategy::Unit,
        })
}

/// Marketaux (`/v1/news/all`). The free plan allows 100 calls a day.
#[must_use]
pub fn marketaux(api_token: impl Into<String>) -> HttpProviderBuilder {
    HttpProvider::builder(MARKETAUX)
        .vendor("Marketaux")
        .base_url("https://api.marketaux.com/v1")
        .auth(Auth::query("api_token", api_token))
        .rules(ErrorRules::marketaux(MARKETAUX))
        .endpoint(
            DataType::News,
            Endpoint::new("/news/all", mx::news)
                .query("symbols", "{symbol}")
                .query("filter_entities", "true")
                .query("language", "en"),
        )
        .quota(QuotaConfig {
            limit: 100,
            window: DAY,
            strategy: QuotaConsumptionStrategy::Unit,
        })
}
