//! 메트릭 상수 및 설명 등록
//!
//! 하니스가 기록하는 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 익스포터는 설치하지 않으며, 레코더가 없으면 `metrics` 매크로는 no-op 입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `tradespec_`
//! - 모듈명: `bus_`, `poll_`, `schema_`, `checks_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(tradespec_core::metrics::BUS_MESSAGES_RECEIVED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 채널 레이블 키 (market, portfolio)
pub const LABEL_CHANNEL: &str = "channel";

/// 스위트 레이블 키
pub const LABEL_SUITE: &str = "suite";

// ─── Event Bus 메트릭 ──────────────────────────────────────────────

/// 이벤트 버스: 수신한 메시지 수 (counter, label: channel)
pub const BUS_MESSAGES_RECEIVED_TOTAL: &str = "tradespec_bus_messages_received_total";

/// 이벤트 버스: 에러 전달 또는 큐 초과로 버린 메시지 수 (counter, label: channel)
pub const BUS_MESSAGES_DROPPED_TOTAL: &str = "tradespec_bus_messages_dropped_total";

/// 이벤트 버스: 요청/응답 왕복 시간 (histogram)
pub const BUS_REQUEST_DURATION_SECONDS: &str = "tradespec_bus_request_duration_seconds";

// ─── Polling 메트릭 ────────────────────────────────────────────────

/// 폴링: 조건 평가 횟수 (counter)
pub const POLL_ATTEMPTS_TOTAL: &str = "tradespec_poll_attempts_total";

/// 폴링: 타임아웃 횟수 (counter)
pub const POLL_TIMEOUTS_TOTAL: &str = "tradespec_poll_timeouts_total";

// ─── Schema 메트릭 ─────────────────────────────────────────────────

/// 스키마: 위반 페이로드 수 (counter)
pub const SCHEMA_VIOLATIONS_TOTAL: &str = "tradespec_schema_violations_total";

// ─── Check 메트릭 ──────────────────────────────────────────────────

/// 성공한 검사 수 (counter, label: suite)
pub const CHECKS_PASSED_TOTAL: &str = "tradespec_checks_passed_total";

/// 실패한 검사 수 (counter, label: suite)
pub const CHECKS_FAILED_TOTAL: &str = "tradespec_checks_failed_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더를 설치한 뒤 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        BUS_MESSAGES_RECEIVED_TOTAL,
        "Messages delivered to a subscription"
    );
    describe_counter!(
        BUS_MESSAGES_DROPPED_TOTAL,
        "Deliveries dropped because of bus errors or a full queue"
    );
    describe_histogram!(
        BUS_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Event bus request/response round-trip time"
    );
    describe_counter!(POLL_ATTEMPTS_TOTAL, "Polling condition evaluations");
    describe_counter!(POLL_TIMEOUTS_TOTAL, "Polling conditions that timed out");
    describe_counter!(SCHEMA_VIOLATIONS_TOTAL, "Payloads that violated a schema");
    describe_counter!(CHECKS_PASSED_TOTAL, "Checks that passed");
    describe_counter!(CHECKS_FAILED_TOTAL, "Checks that failed");
}
