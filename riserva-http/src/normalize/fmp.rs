use serde_json::{Map, Value, json};

use super::{as_f64, consensus, first, num, stamp, text, timestamp, unix_to_rfc3339};

/// `/quote/{symbols}` item.
#[must_use]
pub fn quote(symbol: &str, raw: &Value) -> Value {
    let Some(q) = first(raw) else {
        return Value::Null;
    };
    let mut m = Map::new();
    m.insert("price".into(), num(q.get("price")));
    m.insert("change".into(), num(q.get("change")));
    m.insert("change_percent".into(), num(q.get("changesPercentage")));
    m.insert("open".into(), num(q.get("open")));
    m.insert("high".into(), num(q.get("dayHigh")));
    m.insert("low".into(), num(q.get("dayLow")));
    m.insert("previous_close".into(), num(q.get("previousClose")));
    m.insert("volume".into(), num(q.get("volume")));
    m.insert("timestamp".into(), unix_to_rfc3339(q.get("timestamp")));
    stamp(symbol, m)
}

/// `/profile/{symbols}` item.
#[must_use]
pub fn profile(symbol: &str, raw: &Value) -> Value {
    let Some(p) = first(raw) else {
        return Value::Null;
    };
    let mut m = Map::new();
    m.insert("name".into(), text(p.get("companyName")));
    m.insert("sector".into(), text(p.get("sector")));
    m.insert("industry".into(), text(p.get("industry")));
    m.insert(
        "exchange".into(),
        text(p.get("exchangeShortName").or_else(|| p.get("exchange"))),
    );
    m.insert("currency".into(), text(p.get("currency")));
    m.insert("country".into(), text(p.get("country")));
    m.insert("market_cap".into(), num(p.get("mktCap")));
    m.insert("description".into(), text(p.get("description")));
    stamp(symbol, m)
}

/// `/ratios-ttm/{symbol}`.
#[must_use]
pub fn ratios(symbol: &str, raw: &Value) -> Value {
    let Some(r) = first(raw) else {
        return Value::Null;
    };
    let mut m = Map::new();
    m.insert(
        "pe_ratio".into(),
        num(r.get("peRatioTTM").or_else(|| r.get("priceEarningsRatioTTM"))),
    );
    m.insert("price_to_book".into(), num(r.get("priceToBookRatioTTM")));
    // The upstream field name really is missing the "d".
    m.insert(
        "dividend_yield".into(),
        num(r.get("dividendYielTTM").or_else(|| r.get("dividendYieldTTM"))),
    );
    m.insert("return_on_equity".into(), num(r.get("returnOnEquityTTM")));
    m.insert("debt_to_equity".into(), num(r.get("debtEquityRatioTTM")));
    stamp(symbol, m)
}

/// `/historical-price-full/{symbol}`.
#[must_use]
pub fn prices(symbol: &str, raw: &Value) -> Value {
    let Some(rows) = raw.get("historical").and_then(Value::as_array) else {
        return Value::Null;
    };
    let bars: Vec<Value> = rows
        .iter()
        .filter_map(Value::as_object)
        .filter(|r| r.get("date").is_some())
        .map(|r| {
            json!({
                "date": text(r.get("date")),
                "open": num(r.get("open")),
                "high": num(r.get("high")),
                "low": num(r.get("low")),
                "close": num(r.get("close")),
                "volume": num(r.get("volume")),
            })
        })
        .collect();
    if bars.is_empty() {
        return Value::Null;
    }
    json!({ "symbol": symbol, "bars": bars })
}

/// `/stock_news?tickers={symbol}`.
#[must_use]
pub fn news(symbol: &str, raw: &Value) -> Value {
    let Some(items) = raw.as_array() else {
        return Value::Null;
    };
    let articles: Vec<Value> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|a| {
            json!({
                "title": text(a.get("title")),
                "url": text(a.get("url")),
                "source": text(a.get("site")),
                "published_at": timestamp(a.get("publishedDate")),
                "sentiment": num(a.get("sentimentScore")),
            })
        })
        .collect();
    json!({ "symbol": symbol, "articles": articles })
}

/// `/analyst-stock-recommendations/{symbol}`; the latest row wins.
#[must_use]
pub fn analyst(symbol: &str, raw: &Value) -> Value {
    let Some(r) = first(raw) else {
        return Value::Null;
    };
    let count = |k: &str| as_f64(r.get(k)).unwrap_or(0.0);
    let (sb, b, h, s, ss) = (
        count("analystRatingsStrongBuy"),
        count("analystRatingsbuy"),
        count("analystRatingsHold"),
        count("analystRatingsSell"),
        count("analystRatingsStrongSell"),
    );
    let mut m = Map::new();
    m.insert("consensus".into(), consensus(sb, b, h, s, ss));
    m.insert("strong_buy".into(), num(r.get("analystRatingsStrongBuy")));
    m.insert("buy".into(), num(r.get("analystRatingsbuy")));
    m.insert("hold".into(), num(r.get("analystRatingsHold")));
    m.insert("sell".into(), num(r.get("analystRatingsSell")));
    m.insert("strong_sell".into(), num(r.get("analystRatingsStrongSell")));
    m.insert("price_target".into(), num(r.get("priceTarget")));
    stamp(symbol, m)
}

/// `/historical/earning_calendar/{symbol}`: rows without a reported EPS are upcoming.
#[must_use]
pub fn earnings(symbol: &str, raw: &Value) -> Value {
    let Some(rows) = raw.as_array() else {
        return Value::Null;
    };
    let mut upcoming = Vec::new();
    let mut historical = Vec::new();
    for r in rows.iter().filter_map(Value::as_object) {
        let actual = num(r.get("eps"));
        let estimate = num(r.get("epsEstimated"));
        let date = text(r.get("date"));
        if actual.is_null() {
            upcoming.push(json!({ "date": date, "eps_estimate": estimate }));
        } else {
            historical.push(json!({ "date": date, "eps_actual": actual, "eps_estimate": estimate }));
        }
    }
    if upcoming.is_empty() && historical.is_empty() {
        return Value::Null;
    }
    json!({ "symbol": symbol, "upcoming": upcoming, "historical": historical })
}
