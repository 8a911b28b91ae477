#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`buffer`]: 구독별 수신 페이로드 저장소 (append-only, 도착 순서 보존)
//! - [`poll`]: 고정 간격 조건 평가와 타임아웃
//! - [`schema`]: 선언적 스키마 descriptor와 검증기
//! - [`assert`]: 상태 코드/응답 형태 단언 헬퍼
//! - [`types`]: 시세, 거래, 포트폴리오 등 도메인 타입과 스키마
//! - [`config`]: `tradespec.toml` 설정 + 환경변수 오버라이드
//! - [`error`]: 에러 타입 계층
//! - [`metrics`]: 메트릭 이름 상수
//!
//! # 흐름
//!
//! ```text
//! subscription -> collector -> EventBuffer -> poll_until(len > N) -> validate_all
//! ```

pub mod assert;
pub mod buffer;
pub mod config;
pub mod error;
pub mod metrics;
pub mod poll;
pub mod schema;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    AssertionFailure, ConfigError, ConnectionError, SchemaViolation, TimeoutError, TradespecError,
};

// 설정
pub use config::TradespecConfig;

// 하네스
pub use buffer::EventBuffer;
pub use poll::{PollDescriptor, PollObserver, PollOutcome, PollResult, poll_until, wait};
pub use schema::{CompiledSchema, FieldType, SchemaDescriptor, ValidationResult};

// 도메인 타입
pub use types::{Portfolio, Quote, ServiceRecord, Trade, TradeAction};
