//! Payload fixtures shaped like the trading demo's messages.

#![allow(dead_code)]

use serde_json::{Map, Value, json};

pub const COMPANIES: [(&str, &str); 3] = [
    ("MacroHard", "MCH"),
    ("Black Coat", "BCT"),
    ("Divinator", "DVN"),
];

/// One market quote.
pub fn quote(name: &str, symbol: &str) -> Value {
    json!({
        "exchange": "vert.x stock exchange",
        "symbol": symbol,
        "name": name,
        "bid": 3389.0,
        "ask": 3391.0,
        "volume": 90000,
        "open": 1000,
        "shares": 88000
    })
}

/// Quote service body: company name -> quote.
pub fn quote_book() -> Value {
    let mut book = Map::new();
    for (name, symbol) in COMPANIES {
        book.insert(name.to_owned(), quote(name, symbol));
    }
    Value::Object(book)
}

/// One trade as published on the `portfolio` channel.
pub fn trade(action: &str) -> Value {
    json!({
        "action": action,
        "quote": quote("Divinator", "DVN"),
        "date": 1_487_000_000_000_i64,
        "amount": 3,
        "owned": 12
    })
}

/// `count` alternating BUY / SELL trades.
pub fn trades(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| trade(if i % 2 == 0 { "BUY" } else { "SELL" }))
            .collect(),
    )
}

/// `count` discovery records, all with `status`.
pub fn discovery_records(count: usize, status: &str) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                json!({
                    "name": format!("service-{i}"),
                    "status": status,
                    "registration": format!("reg-{i}"),
                    "type": "http-endpoint"
                })
            })
            .collect(),
    )
}

pub fn portfolio(cash: f64) -> Value {
    json!({ "cash": cash, "shares": { "Divinator": 12 } })
}
