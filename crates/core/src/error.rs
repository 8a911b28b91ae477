//! 에러 타입 — 시나리오 실패 종류별 에러 정의
//!
//! 모든 에러는 시나리오 실패로 그대로 보고됩니다. 자동 재시도는 없습니다.

use std::time::Duration;

/// tradespec 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum TradespecError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 이벤트 버스 / HTTP 엔드포인트 연결 실패
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// 폴링 조건 미충족
    #[error("timeout: {0}")]
    Timeout(#[from] TimeoutError),

    /// 페이로드 스키마 위반
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    /// 상태 코드 또는 응답 형태 불일치
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 연결 실패
///
/// HTTP 요청 실패와 이벤트 버스 연결/요청 실패를 모두 표현합니다.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// 엔드포인트에 도달할 수 없음
    #[error("endpoint unreachable: {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    /// 핸드셰이크 실패 또는 ready 신호 미수신
    #[error("handshake failed: {endpoint}: {reason}")]
    Handshake { endpoint: String, reason: String },

    /// 연결이 닫힘
    #[error("connection closed: {0}")]
    Closed(String),

    /// 요청/응답 실패 (원격 서비스가 에러로 응답)
    #[error("request to '{address}' failed: {reason}")]
    Request { address: String, reason: String },

    /// 응답 본문 디코딩 실패
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// 폴링 조건이 최대 시도 횟수 안에 충족되지 않음
#[derive(Debug, Clone, thiserror::Error)]
#[error("condition '{condition}' not met after {attempts} attempts ({elapsed:?} elapsed)")]
pub struct TimeoutError {
    /// 조건 설명
    pub condition: String,
    /// 수행한 평가 횟수
    pub attempts: u32,
    /// 첫 평가부터 마지막 평가까지 경과 시간
    pub elapsed: Duration,
}

/// 페이로드 하나가 스키마를 위반함
#[derive(Debug, Clone, thiserror::Error)]
#[error("item {index} violates '{schema}': {}", violations.join("; "))]
pub struct SchemaViolation {
    /// 스키마 이름
    pub schema: String,
    /// 이벤트 버퍼 내 위치
    pub index: usize,
    /// 발견된 모든 위반 사항
    pub violations: Vec<String>,
}

/// 단언 실패 (기대값 vs 실제값)
#[derive(Debug, Clone, thiserror::Error)]
#[error("{context}: expected {expected}, got {actual}")]
pub struct AssertionFailure {
    /// 단언 대상 설명
    pub context: String,
    /// 기대값
    pub expected: String,
    /// 실제값
    pub actual: String,
}

impl AssertionFailure {
    /// 새 단언 실패를 생성합니다.
    pub fn new(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
