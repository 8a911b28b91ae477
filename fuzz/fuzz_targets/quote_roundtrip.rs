#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use tradespec_core::types::{Quote, Trade, TradeAction, quote_schema, trade_schema};

/// 퍼저용 구조적 시세 입력
#[derive(Arbitrary, Debug)]
struct FuzzQuote {
    exchange: String,
    symbol: String,
    name: String,
    bid: f64,
    ask: f64,
    volume: f64,
    open: f64,
    shares: f64,
}

#[derive(Arbitrary, Debug)]
struct FuzzTrade {
    buy: bool,
    quote: FuzzQuote,
    date: i64,
    amount: f64,
    owned: f64,
}

impl FuzzQuote {
    fn to_quote(&self) -> Quote {
        Quote {
            exchange: self.exchange.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            bid: self.bid,
            ask: self.ask,
            volume: self.volume,
            open: self.open,
            shares: self.shares,
        }
    }

    fn is_finite(&self) -> bool {
        [self.bid, self.ask, self.volume, self.open, self.shares]
            .iter()
            .all(|v| v.is_finite())
    }
}

fuzz_target!(|input: FuzzTrade| {
    // JSON은 NaN/무한대를 표현하지 못함
    if !input.quote.is_finite() || !input.amount.is_finite() || !input.owned.is_finite() {
        return;
    }

    let trade = Trade {
        action: if input.buy { TradeAction::Buy } else { TradeAction::Sell },
        quote: input.quote.to_quote(),
        date: input.date,
        amount: input.amount,
        owned: input.owned,
    };

    // 타입이 있는 값은 항상 스키마를 통과해야 함
    let quote = serde_json::to_value(&trade.quote).expect("quote serializes");
    let compiled = quote_schema().compile().expect("quote schema compiles");
    assert!(compiled.validate(&quote).is_valid(), "typed quote rejected: {quote}");

    let value = serde_json::to_value(&trade).expect("trade serializes");
    let compiled = trade_schema().compile().expect("trade schema compiles");
    assert!(compiled.validate(&value).is_valid(), "typed trade rejected: {value}");

    let back: Trade = serde_json::from_value(value).expect("trade deserializes");
    assert_eq!(back.action, trade.action);
});
