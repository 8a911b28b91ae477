//! 도메인 타입 — 트레이딩 시스템이 주고받는 페이로드
//!
//! 이벤트 버스와 REST 엔드포인트가 전달하는 JSON의 타입 표현과,
//! 그 형태를 검증하는 스키마 descriptor를 정의합니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{FieldType, SchemaDescriptor};

/// 주식 시세
///
/// `market` 채널로 발행됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 거래소
    pub exchange: String,
    /// 종목 코드
    pub symbol: String,
    /// 회사 이름
    pub name: String,
    /// 매수 호가
    pub bid: f64,
    /// 매도 호가
    pub ask: f64,
    /// 거래량
    pub volume: f64,
    /// 시가
    pub open: f64,
    /// 발행 주식 수
    pub shares: f64,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) bid={} ask={}",
            self.name, self.symbol, self.bid, self.ask,
        )
    }
}

/// 매매 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl TradeAction {
    /// 와이어 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 체결된 거래
///
/// `portfolio` 채널로 발행되고, 감사 서비스가 보관합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// 매매 방향
    pub action: TradeAction,
    /// 체결 시점의 시세
    pub quote: Quote,
    /// 체결 시각 (epoch millis)
    pub date: i64,
    /// 체결 수량
    pub amount: f64,
    /// 체결 후 보유 수량
    pub owned: f64,
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x{} (owned {})",
            self.action, self.quote.name, self.amount, self.owned,
        )
    }
}

/// 포트폴리오 상태 (`getPortfolio` 응답)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// 보유 현금
    pub cash: f64,
    /// 회사 이름 → 보유 주식 수
    #[serde(default)]
    pub shares: BTreeMap<String, f64>,
}

/// 서비스 디스커버리 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// 서비스 이름
    pub name: String,
    /// 상태 (`UP`, `DOWN`, `OUT_OF_SERVICE` 등)
    pub status: String,
    /// 나머지 필드 (type, location, metadata ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRecord {
    /// 서비스가 `UP` 상태인지 확인합니다.
    pub fn is_up(&self) -> bool {
        self.status == "UP"
    }
}

/// 시세 필드와 타입 (필수 여부 제외)
fn quote_fields() -> [(&'static str, FieldType); 8] {
    [
        ("volume", FieldType::Number),
        ("shares", FieldType::Number),
        ("symbol", FieldType::String),
        ("name", FieldType::String),
        ("ask", FieldType::Number),
        ("exchange", FieldType::String),
        ("bid", FieldType::Number),
        ("open", FieldType::Number),
    ]
}

/// 시세 스키마: 8개 필드 모두 필수
pub fn quote_schema() -> SchemaDescriptor {
    quote_fields()
        .into_iter()
        .fold(SchemaDescriptor::new("quote schema"), |schema, (name, kind)| {
            schema.required(name, kind)
        })
}

/// 거래 스키마
///
/// `action`, `quote`, `date`, `amount`, `owned`가 필수이며, 중첩된 `quote`는
/// 존재하는 필드의 타입만 검사합니다.
pub fn trade_schema() -> SchemaDescriptor {
    let quote = quote_fields()
        .into_iter()
        .fold(SchemaDescriptor::new("quote"), |schema, (name, kind)| {
            schema.optional(name, kind)
        });

    SchemaDescriptor::new("trade schema")
        .required_enum("action", [TradeAction::Buy.as_str(), TradeAction::Sell.as_str()])
        .required("quote", FieldType::Object(quote))
        .required("date", FieldType::Number)
        .required("amount", FieldType::Number)
        .required("owned", FieldType::Number)
}
