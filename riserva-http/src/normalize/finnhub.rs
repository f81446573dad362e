use serde_json::{Map, Value, json};

use super::{as_f64, consensus, first, num, stamp, text, unix_to_rfc3339};

/// `/quote?symbol=`. Unknown symbols come back as all zeros.
#[must_use]
pub fn quote(symbol: &str, raw: &Value) -> Value {
    let Some(q) = raw.as_object() else {
        return Value::Null;
    };
    let price = as_f64(q.get("c")).unwrap_or(0.0);
    let ts = q.get("t").and_then(Value::as_i64).unwrap_or(0);
    if price == 0.0 && ts == 0 {
        return Value::Null;
    }
    let mut m = Map::new();
    m.insert("price".into(), num(q.get("c")));
    m.insert("change".into(), num(q.get("d")));
    m.insert("change_percent".into(), num(q.get("dp")));
    m.insert("open".into(), num(q.get("o")));
    m.insert("high".into(), num(q.get("h")));
    m.insert("low".into(), num(q.get("l")));
    m.insert("previous_close".into(), num(q.get("pc")));
    m.insert("volume".into(), Value::Null);
    m.insert("timestamp".into(), unix_to_rfc3339(q.get("t")));
    stamp(symbol, m)
}

/// `/stock/profile2?symbol=`. Market cap is published in millions.
#[must_use]
pub fn profile(symbol: &str, raw: &Value) -> Value {
    let Some(p) = raw.as_object() else {
        return Value::Null;
    };
    let market_cap = as_f64(p.get("marketCapitalization"))
        .map_or(Value::Null, |mcap| Value::from((mcap * 1_000_000.0).round()));
    let mut m = Map::new();
    m.insert("name".into(), text(p.get("name")));
    m.insert("sector".into(), text(p.get("finnhubIndustry")));
    m.insert("industry".into(), text(p.get("finnhubIndustry")));
    m.insert("exchange".into(), text(p.get("exchange")));
    m.insert("currency".into(), text(p.get("currency")));
    m.insert("country".into(), text(p.get("country")));
    m.insert("market_cap".into(), market_cap);
    m.insert("description".into(), Value::Null);
    stamp(symbol, m)
}

/// `/stock/metric?symbol=&metric=all`.
#[must_use]
pub fn ratios(symbol: &str, raw: &Value) -> Value {
    let Some(metric) = raw.get("metric").and_then(Value::as_object) else {
        return Value::Null;
    };
    let pick = |keys: &[&str]| {
        keys.iter()
            .map(|k| num(metric.get(*k)))
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null)
    };
    let mut m = Map::new();
    m.insert("pe_ratio".into(), pick(&["peTTM", "peBasicExclExtraTTM"]));
    m.insert("price_to_book".into(), pick(&["pbQuarterly", "pbAnnual"]));
    m.insert(
        "dividend_yield".into(),
        pick(&["dividendYieldIndicatedAnnual", "currentDividendYieldTTM"]),
    );
    m.insert("return_on_equity".into(), pick(&["roeTTM", "roeRfy"]));
    m.insert(
        "debt_to_equity".into(),
        pick(&["totalDebt/totalEquityQuarterly", "totalDebt/totalEquityAnnual"]),
    );
    stamp(symbol, m)
}

/// `/stock/recommendation?symbol=`; rows are newest first.
#[must_use]
pub fn analyst(symbol: &str, raw: &Value) -> Value {
    let Some(r) = first(raw) else {
        return Value::Null;
    };
    let count = |k: &str| as_f64(r.get(k)).unwrap_or(0.0);
    let mut m = Map::new();
    m.insert(
        "consensus".into(),
        consensus(
            count("strongBuy"),
            count("buy"),
            count("hold"),
            count("sell"),
            count("strongSell"),
        ),
    );
    m.insert("strong_buy".into(), num(r.get("strongBuy")));
    m.insert("buy".into(), num(r.get("buy")));
    m.insert("hold".into(), num(r.get("hold")));
    m.insert("sell".into(), num(r.get("sell")));
    m.insert("strong_sell".into(), num(r.get("strongSell")));
    m.insert("price_target".into(), Value::Null);
    stamp(symbol, m)
}

/// `/stock/earnings?symbol=`; only reported quarters.
#[must_use]
pub fn earnings(symbol: &str, raw: &Value) -> Value {
    let Some(rows) = raw.as_array() else {
        return Value::Null;
    };
    let historical: Vec<Value> = rows
        .iter()
        .filter_map(Value::as_object)
        .map(|r| {
            json!({
                "date": text(r.get("period")),
                "eps_actual": num(r.get("actual")),
                "eps_estimate": num(r.get("estimate")),
            })
        })
        .collect();
    if historical.is_empty() {
        return Value::Null;
    }
    json!({ "symbol": symbol, "upcoming": [], "historical": historical })
}
