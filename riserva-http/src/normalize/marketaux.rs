use serde_json::{Value, json};

use super::{num, text, timestamp};

/// `/news/all?symbols={symbol}`; sentiment comes from the matching entity.
#[must_use]
pub fn news(symbol: &str, raw: &Value) -> Value {
    let Some(data) = raw.get("data").and_then(Value::as_array) else {
        return Value::Null;
    };
    let articles: Vec<Value> = data
        .iter()
        .filter_map(Value::as_object)
        .map(|a| {
            let sentiment = a
                .get("entities")
                .and_then(Value::as_array)
                .and_then(|es| {
                    es.iter().find(|e| {
                        e.get("symbol")
                            .and_then(Value::as_str)
                            .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
                    })
                })
                .map_or(Value::Null, |e| num(e.get("sentiment_score")));
            json!({
                "title": text(a.get("title")),
                "url": text(a.get("url")),
                "source": text(a.get("source")),
                "published_at": timestamp(a.get("published_at")),
                "sentiment": sentiment,
            })
        })
        .collect();
    json!({ "symbol": symbol, "articles": articles })
}
