use serde_json::{Value, json};

use riserva_core::DataType;

/// Symbols with fixture data.
pub const SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOGL", "NVDA", "TSLA"];

struct Company {
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
    industry: &'static str,
    price: f64,
    previous_close: f64,
    market_cap: u64,
    pe: f64,
}

const COMPANIES: &[Company] = &[
    Company {
        symbol: "AAPL",
        name: "Apple Inc.",
        sector: "Technology",
        industry: "Consumer Electronics",
        price: 190.0,
        previous_close: 188.0,
        market_cap: 2_950_000_000_000,
        pe: 29.4,
    },
    Company {
        symbol: "MSFT",
        name: "Microsoft Corp",
        sector: "Technology",
        industry: "Software - Infrastructure",
        price: 420.0,
        previous_close: 418.0,
        market_cap: 3_120_000_000_000,
        pe: 35.1,
    },
    Company {
        symbol: "GOOGL",
        name: "Alphabet Inc. Class A",
        sector: "Communication Services",
        industry: "Internet Content & Information",
        price: 150.0,
        previous_close: 148.0,
        market_cap: 1_870_000_000_000,
        pe: 23.8,
    },
    Company {
        symbol: "NVDA",
        name: "NVIDIA Corp",
        sector: "Technology",
        industry: "Semiconductors",
        price: 1000.0,
        previous_close: 990.0,
        market_cap: 2_460_000_000_000,
        pe: 64.2,
    },
    Company {
        symbol: "TSLA",
        name: "Tesla, Inc.",
        sector: "Consumer Cyclical",
        industry: "Auto Manufacturers",
        price: 250.0,
        previous_close: 245.0,
        market_cap: 797_000_000_000,
        pe: 71.5,
    },
];

fn company(symbol: &str) -> Option<&'static Company> {
    COMPANIES.iter().find(|c| c.symbol == symbol)
}

/// Fixture payload for a symbol and data type, already in canonical shape.
pub fn payload(symbol: &str, data_type: DataType) -> Option<Value> {
    let c = company(symbol)?;
    let v = match data_type {
        DataType::Quote => {
            let change = c.price - c.previous_close;
            json!({
                "symbol": c.symbol,
                "price": c.price,
                "change": change,
                "change_percent": (change / c.previous_close * 10_000.0).round() / 100.0,
                "open": c.previous_close,
                "high": c.price * 1.01,
                "low": c.previous_close * 0.99,
                "previous_close": c.previous_close,
                "volume": 52_000_000u64,
                "timestamp": "2024-06-03T20:00:00Z",
            })
        }
        DataType::Profile => json!({
            "symbol": c.symbol,
            "name": c.name,
            "sector": c.sector,
            "industry": c.industry,
            "exchange": "NASDAQ",
            "currency": "USD",
            "country": "US",
            "market_cap": c.market_cap,
            "description": format!("{} fixture profile", c.name),
        }),
        DataType::Ratios => json!({
            "symbol": c.symbol,
            "pe_ratio": c.pe,
            "price_to_book": 12.5,
            "dividend_yield": 0.005,
            "return_on_equity": 0.31,
            "debt_to_equity": 1.2,
        }),
        DataType::News => json!({
            "symbol": c.symbol,
            "articles": [
                {
                    "title": format!("{} beats expectations", c.name),
                    "url": format!("https://news.example.com/{}/1", c.symbol.to_ascii_lowercase()),
                    "source": "Example Wire",
                    "published_at": "2024-06-03T12:00:00Z",
                    "sentiment": 0.4,
                },
                {
                    "title": format!("What's next for {}", c.name),
                    "url": format!("https://news.example.com/{}/2", c.symbol.to_ascii_lowercase()),
                    "source": "Example Daily",
                    "published_at": "2024-06-02T09:30:00Z",
                    "sentiment": Value::Null,
                },
            ],
        }),
        DataType::Prices => {
            let bars: Vec<Value> = ["2024-06-03", "2024-05-31", "2024-05-30"]
                .iter()
                .enumerate()
                .map(|(i, date)| {
                    #[allow(clippy::cast_precision_loss)]
                    let close = c.price - i as f64;
                    json!({
                        "date": date,
                        "open": close - 0.5,
                        "high": close + 1.0,
                        "low": close - 1.5,
                        "close": close,
                        "volume": 40_000_000u64,
                    })
                })
                .collect();
            json!({ "symbol": c.symbol, "bars": bars })
        }
        DataType::Analyst => json!({
            "symbol": c.symbol,
            "consensus": "buy",
            "strong_buy": 12,
            "buy": 20,
            "hold": 8,
            "sell": 1,
            "strong_sell": 0,
            "price_target": c.price * 1.15,
        }),
        DataType::Earnings => json!({
            "symbol": c.symbol,
            "upcoming": [{ "date": "2024-08-01", "eps_estimate": 1.35 }],
            "historical": [
                { "date": "2024-05-02", "eps_actual": 1.53, "eps_estimate": 1.50 },
                { "date": "2024-02-01", "eps_actual": 2.18, "eps_estimate": 2.10 },
            ],
        }),
        DataType::Sector => json!({
            "symbol": c.symbol,
            "sectors": [{ "name": c.sector, "weight": 100.0 }],
        }),
    };
    Some(v)
}
