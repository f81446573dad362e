use serde_json::{Map, Value, json};

use super::{num, stamp, text, timestamp, weight_percent};

/// `function=GLOBAL_QUOTE`.
#[must_use]
pub fn quote(symbol: &str, raw: &Value) -> Value {
    let Some(q) = raw.get("Global Quote").and_then(Value::as_object) else {
        return Value::Null;
    };
    let mut m = Map::new();
    m.insert("price".into(), num(q.get("05. price")));
    m.insert("change".into(), num(q.get("09. change")));
    m.insert("change_percent".into(), num(q.get("10. change percent")));
    m.insert("open".into(), num(q.get("02. open")));
    m.insert("high".into(), num(q.get("03. high")));
    m.insert("low".into(), num(q.get("04. low")));
    m.insert("previous_close".into(), num(q.get("08. previous close")));
    m.insert("volume".into(), num(q.get("06. volume")));
    m.insert("timestamp".into(), timestamp(q.get("07. latest trading day")));
    stamp(symbol, m)
}

/// `function=TIME_SERIES_DAILY`; bars newest first.
#[must_use]
pub fn prices(symbol: &str, raw: &Value) -> Value {
    let Some(series) = raw.get("Time Series (Daily)").and_then(Value::as_object) else {
        return Value::Null;
    };
    let mut dates: Vec<&String> = series.keys().collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    let bars: Vec<Value> = dates
        .into_iter()
        .filter_map(|d| {
            let bar = series.get(d)?.as_object()?;
            Some(json!({
                "date": d,
                "open": num(bar.get("1. open")),
                "high": num(bar.get("2. high")),
                "low": num(bar.get("3. low")),
                "close": num(bar.get("4. close")),
                "volume": num(bar.get("5. volume")),
            }))
        })
        .collect();
    if bars.is_empty() {
        return Value::Null;
    }
    json!({ "symbol": symbol, "bars": bars })
}

/// `function=OVERVIEW`.
#[must_use]
pub fn profile(symbol: &str, raw: &Value) -> Value {
    let Some(o) = raw.as_object() else {
        return Value::Null;
    };
    let mut m = Map::new();
    m.insert("name".into(), text(o.get("Name")));
    m.insert("sector".into(), text(o.get("Sector")));
    m.insert("industry".into(), text(o.get("Industry")));
    m.insert("exchange".into(), text(o.get("Exchange")));
    m.insert("currency".into(), text(o.get("Currency")));
    m.insert("country".into(), text(o.get("Country")));
    m.insert("market_cap".into(), num(o.get("MarketCapitalization")));
    m.insert("description".into(), text(o.get("Description")));
    stamp(symbol, m)
}

/// Ratios from `function=OVERVIEW`; debt to equity is not published there.
#[must_use]
pub fn ratios(symbol: &str, raw: &Value) -> Value {
    let Some(o) = raw.as_object() else {
        return Value::Null;
    };
    let mut m = Map::new();
    m.insert(
        "pe_ratio".into(),
        num(o.get("PERatio").or_else(|| o.get("TrailingPE"))),
    );
    m.insert("price_to_book".into(), num(o.get("PriceToBookRatio")));
    m.insert("dividend_yield".into(), num(o.get("DividendYield")));
    m.insert("return_on_equity".into(), num(o.get("ReturnOnEquityTTM")));
    m.insert("debt_to_equity".into(), Value::Null);
    stamp(symbol, m)
}

/// `function=NEWS_SENTIMENT&tickers={symbol}`.
///
/// The per-ticker sentiment score is preferred over the article-wide one.
#[must_use]
pub fn news(symbol: &str, raw: &Value) -> Value {
    let Some(feed) = raw.get("feed").and_then(Value::as_array) else {
        return Value::Null;
    };
    let articles: Vec<Value> = feed
        .iter()
        .filter_map(Value::as_object)
        .map(|a| {
            let ticker_score = a
                .get("ticker_sentiment")
                .and_then(Value::as_array)
                .and_then(|ts| {
                    ts.iter().find(|t| {
                        t.get("ticker")
                            .and_then(Value::as_str)
                            .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
                    })
                })
                .map(|t| num(t.get("ticker_sentiment_score")))
                .filter(|v| !v.is_null());
            json!({
                "title": text(a.get("title")),
                "url": text(a.get("url")),
                "source": text(a.get("source")),
                "published_at": timestamp(a.get("time_published")),
                "sentiment": ticker_score.unwrap_or_else(|| num(a.get("overall_sentiment_score"))),
            })
        })
        .collect();
    json!({ "symbol": symbol, "articles": articles })
}

/// `function=EARNINGS`; only reported quarters are published.
#[must_use]
pub fn earnings(symbol: &str, raw: &Value) -> Value {
    let Some(rows) = raw.get("quarterlyEarnings").and_then(Value::as_array) else {
        return Value::Null;
    };
    let historical: Vec<Value> = rows
        .iter()
        .filter_map(Value::as_object)
        .map(|r| {
            json!({
                "date": text(r.get("reportedDate").or_else(|| r.get("fiscalDateEnding"))),
                "eps_actual": num(r.get("reportedEPS")),
                "eps_estimate": num(r.get("estimatedEPS")),
            })
        })
        .collect();
    if historical.is_empty() {
        return Value::Null;
    }
    json!({ "symbol": symbol, "upcoming": [], "historical": historical })
}

/// `function=ETF_PROFILE` sector weights, as percentages.
#[must_use]
pub fn sector(symbol: &str, raw: &Value) -> Value {
    let Some(rows) = raw.get("sectors").and_then(Value::as_array) else {
        return Value::Null;
    };
    let sectors: Vec<Value> = rows
        .iter()
        .filter_map(|r| {
            let name = text(r.get("sector"));
            let weight = weight_percent(r.get("weight"));
            (!name.is_null() && !weight.is_null()).then(|| json!({ "name": name, "weight": weight }))
        })
        .collect();
    if sectors.is_empty() {
        return Value::Null;
    }
    json!({ "symbol": symbol, "sectors": sectors })
}
