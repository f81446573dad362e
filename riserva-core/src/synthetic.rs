//! Deterministic last-resort payloads.
//!
//! Every payload is derived from a seed computed from the symbol (and data type),
//! so the same request always yields the same value. Payloads carry
//! `"synthetic": true` so downstream consumers can tell them apart.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::DataType;

const DEFAULT_VOLATILITY: f64 = 0.02;
const PRICE_BARS: usize = 30;

/// Known anchors for a handful of index, currency and commodity symbols.
const ANCHORS: &[(&str, f64, f64)] = &[
    ("SPX", 5563.75, 0.02),
    ("IXIC", 17458.24, 0.025),
    ("DJI", 40844.09, 0.015),
    ("TSX", 20123.45, 0.018),
    ("EURUSD", 1.0844, 0.001),
    ("GOLD", 2577.50, 0.01),
    ("OIL", 68.31, 0.02),
    ("BTCUSD", 121_252.00, 0.03),
];

const SECTORS: &[&str] = &[
    "Technology",
    "Healthcare",
    "Financial Services",
    "Consumer Cyclical",
    "Industrials",
    "Energy",
    "Utilities",
    "Communication Services",
];

/// Generator of plausible, deterministic payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticGenerator;

impl SyntheticGenerator {
    /// Create a generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Base price and volatility for a symbol.
    ///
    /// Known anchors use their reference level; anything else gets a price in
    /// `[10, 510)` derived from the symbol hash and a 2% volatility.
    #[must_use]
    pub fn anchor(symbol: &str) -> (f64, f64) {
        if let Some((_, base, vol)) = ANCHORS.iter().find(|(s, _, _)| *s == symbol) {
            return (*base, *vol);
        }
        let h = fnv1a(symbol.as_bytes());
        #[allow(clippy::cast_precision_loss)]
        let base = 10.0 + (h % 50_000) as f64 / 100.0;
        (base, DEFAULT_VOLATILITY)
    }

    /// Generate the payload for `symbol` and `data_type`.
    ///
    /// Price bars are dated back from today's UTC date.
    #[must_use]
    pub fn generate(&self, symbol: &str, data_type: DataType) -> Value {
        self.generate_as_of(symbol, data_type, Utc::now().date_naive())
    }

    /// Like [`generate`](Self::generate) with price bars dated back from `today`.
    #[must_use]
    pub fn generate_as_of(&self, symbol: &str, data_type: DataType, today: NaiveDate) -> Value {
        let (base, vol) = Self::anchor(symbol);
        let mut rng = StdRng::seed_from_u64(seed(symbol, data_type));
        let mut payload = match data_type {
            DataType::Quote => quote(&mut rng, base, vol),
            DataType::Prices => prices(&mut rng, base, vol, today),
            DataType::Ratios => ratios(&mut rng),
            DataType::Analyst => analyst(&mut rng, base),
            DataType::Profile => json!({
                "name": format!("{symbol} (synthetic)"),
                "sector": SECTORS[rng.random_range(0..SECTORS.len())],
                "industry": Value::Null,
                "exchange": Value::Null,
                "currency": "USD",
                "country": Value::Null,
                "market_cap": Value::Null,
                "description": Value::Null,
            }),
            DataType::News => json!({ "articles": [] }),
            DataType::Earnings => json!({ "upcoming": [], "historical": [] }),
            DataType::Sector => sector(&mut rng),
        };
        if let Value::Object(map) = &mut payload {
            map.insert("symbol".into(), Value::String(symbol.to_string()));
            map.insert("synthetic".into(), Value::Bool(true));
        }
        payload
    }
}

fn quote(rng: &mut StdRng, base: f64, vol: f64) -> Value {
    let change = rng.random_range(-vol..=vol);
    let price = base * (1.0 + change);
    let high = price * (1.0 + rng.random_range(0.0..0.01));
    let low = price * (1.0 - rng.random_range(0.0..0.01));
    let open = base * (1.0 + rng.random_range(-0.0025..0.0025));
    json!({
        "price": round2(price),
        "change": round2(price - base),
        "change_percent": round2((price - base) / base * 100.0),
        "open": round2(open),
        "high": round2(high),
        "low": round2(low),
        "previous_close": round2(base),
        "volume": Value::Null,
        "timestamp": Value::Null,
    })
}

/// Bounded random walk anchored at `base`; index 0 is the most recent session.
fn prices(rng: &mut StdRng, base: f64, vol: f64, today: NaiveDate) -> Value {
    let mut close = base;
    let mut bars = Vec::with_capacity(PRICE_BARS);
    let mut date = last_weekday(today);
    for _ in 0..PRICE_BARS {
        let open = close * (1.0 + rng.random_range(-vol / 2.0..=vol / 2.0));
        let high = open.max(close) * (1.0 + rng.random_range(0.0..vol / 2.0));
        let low = open.min(close) * (1.0 - rng.random_range(0.0..vol / 2.0));
        bars.push(json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "open": round2(open),
            "high": round2(high),
            "low": round2(low),
            "close": round2(close),
            "volume": rng.random_range(100_000u64..5_000_000),
        }));
        // step backwards in time, pulled toward the anchor
        let drift = (base - open) / base * 0.1;
        close = open * (1.0 + drift);
        date = last_weekday(date.checked_sub_days(Days::new(1)).unwrap_or(date));
    }
    json!({ "bars": bars })
}

/// `day` itself, or the Friday before it when it falls on a weekend.
fn last_weekday(day: NaiveDate) -> NaiveDate {
    let back = match day.weekday() {
        Weekday::Sat => 1,
        Weekday::Sun => 2,
        _ => 0,
    };
    day.checked_sub_days(Days::new(back)).unwrap_or(day)
}

fn ratios(rng: &mut StdRng) -> Value {
    json!({
        "pe_ratio": round2(rng.random_range(8.0..40.0)),
        "price_to_book": round2(rng.random_range(0.8..12.0)),
        "dividend_yield": round2(rng.random_range(0.0..0.05)),
        "return_on_equity": round2(rng.random_range(0.02..0.35)),
        "debt_to_equity": round2(rng.random_range(0.1..2.5)),
    })
}

fn analyst(rng: &mut StdRng, base: f64) -> Value {
    let strong_buy: u32 = rng.random_range(0..10);
    let buy: u32 = rng.random_range(0..15);
    let hold: u32 = rng.random_range(0..15);
    let sell: u32 = rng.random_range(0..5);
    let strong_sell: u32 = rng.random_range(0..3);
    let consensus = if strong_buy + buy > hold + sell + strong_sell {
        "buy"
    } else if sell + strong_sell > strong_buy + buy {
        "sell"
    } else {
        "hold"
    };
    json!({
        "consensus": consensus,
        "strong_buy": strong_buy,
        "buy": buy,
        "hold": hold,
        "sell": sell,
        "strong_sell": strong_sell,
        "price_target": round2(base * rng.random_range(0.9..1.3)),
    })
}

fn sector(rng: &mut StdRng) -> Value {
    let raw: Vec<f64> = SECTORS.iter().map(|_| rng.random_range(1.0..10.0)).collect();
    let total: f64 = raw.iter().sum();
    let sectors: Vec<Value> = SECTORS
        .iter()
        .zip(raw)
        .map(|(name, w)| json!({ "name": name, "weight": round2(w / total * 100.0) }))
        .collect();
    json!({ "sectors": sectors })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn seed(symbol: &str, data_type: DataType) -> u64 {
    fnv1a(symbol.as_bytes()) ^ fnv1a(data_type.as_str().as_bytes()).rotate_left(17)
}

/// 64-bit FNV-1a; stable across platforms and releases, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0100_0000_01b3);
    }
    h
}
