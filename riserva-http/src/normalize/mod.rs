//! Vendor response normalizers.
//!
//! Every normalizer returns the canonical payload for its data type, stamped
//! with the requested symbol, or `Value::Null` when the upstream had nothing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Alpha Vantage.
pub mod alpha_vantage;
/// Financial Modeling Prep.
pub mod fmp;
/// Finnhub.
pub mod finnhub;
/// Marketaux.
pub mod marketaux;

/// Coerce vendor numbers into JSON numbers.
///
/// Accepts numbers and numeric strings (`"12.5"`, `"1,234"`, `"0.42%"`);
/// placeholders such as `"None"`, `"-"` and blanks become `null`.
pub(crate) fn num(v: Option<&Value>) -> Value {
    match v {
        Some(Value::Number(n)) => Value::Number(n.clone()),
        Some(Value::String(s)) => parse_number(s).map_or(Value::Null, Value::from),
        _ => Value::Null,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim().trim_end_matches('%').replace(',', "");
    if t.is_empty() || t == "-" || t.eq_ignore_ascii_case("none") {
        return None;
    }
    t.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Numeric value as `f64`, for computations.
pub(crate) fn as_f64(v: Option<&Value>) -> Option<f64> {
    num(v).as_f64()
}

/// String member, with blanks dropped.
pub(crate) fn text(v: Option<&Value>) -> Value {
    match v {
        Some(Value::String(s)) if !s.trim().is_empty() && s != "None" => {
            Value::String(s.trim().to_string())
        }
        _ => Value::Null,
    }
}

/// First element of an array response, or the response itself when it is an object.
pub(crate) fn first(raw: &Value) -> Option<&Map<String, Value>> {
    match raw {
        Value::Array(a) => a.first().and_then(Value::as_object),
        Value::Object(o) if !o.is_empty() => Some(o),
        _ => None,
    }
}

/// Unix seconds to RFC 3339.
pub(crate) fn unix_to_rfc3339(v: Option<&Value>) -> Value {
    v.and_then(Value::as_i64)
        .filter(|s| *s > 0)
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map_or(Value::Null, |d| Value::String(d.to_rfc3339()))
}

/// Vendor timestamps (`2024-06-03 12:00:00`, `20240603T120000`, RFC 3339 or a
/// bare date) to RFC 3339.
pub(crate) fn timestamp(v: Option<&Value>) -> Value {
    let Some(s) = v.and_then(Value::as_str).map(str::trim) else {
        return Value::Null;
    };
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Value::String(d.with_timezone(&Utc).to_rfc3339());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y%m%dT%H%M%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(n) = NaiveDateTime::parse_from_str(s, fmt) {
            return Value::String(n.and_utc().to_rfc3339());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(Value::Null, |n| Value::String(n.and_utc().to_rfc3339()))
}

/// Percentage weight, accepting both `"51.1%"` and fractional `"0.511"`.
pub(crate) fn weight_percent(v: Option<&Value>) -> Value {
    let raw = match v {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Value::Null,
    };
    let Some(parsed) = parse_number(&raw) else {
        return Value::Null;
    };
    if raw.ends_with('%') || parsed > 1.0 {
        Value::from(parsed)
    } else {
        Value::from((parsed * 10_000.0).round() / 100.0)
    }
}

/// Consensus label from recommendation counts; `null` without any votes.
pub(crate) fn consensus(strong_buy: f64, buy: f64, hold: f64, sell: f64, strong_sell: f64) -> Value {
    let total = strong_buy + buy + hold + sell + strong_sell;
    if total <= 0.0 {
        return Value::Null;
    }
    let score = (2.0 * strong_buy + buy - sell - 2.0 * strong_sell) / total;
    let label = if score >= 1.5 {
        "strong_buy"
    } else if score >= 0.5 {
        "buy"
    } else if score > -0.5 {
        "hold"
    } else if score > -1.5 {
        "sell"
    } else {
        "strong_sell"
    };
    Value::String(label.to_string())
}

/// Insert `symbol` and return the object, or `Value::Null` when every other member is null.
pub(crate) fn stamp(symbol: &str, mut m: Map<String, Value>) -> Value {
    if m.values().all(Value::is_null) {
        return Value::Null;
    }
    m.insert("symbol".to_string(), Value::String(symbol.to_string()));
    Value::Object(m)
}
