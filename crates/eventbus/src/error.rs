//! 이벤트 버스 에러 타입
//!
//! [`EventBusError`]는 브리지 연결, 구독, 요청/응답에서 발생하는 모든 에러를
//! 표현합니다. `From<EventBusError> for TradespecError` 변환이 구현되어 있어
//! 시나리오 레이어에서 `?` 연산자로 전파할 수 있습니다.

use std::time::Duration;

use tradespec_core::error::{ConnectionError, TimeoutError, TradespecError};

/// 이벤트 버스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    /// 브리지 URL이 잘못됨
    #[error("invalid bus url '{url}': {reason}")]
    InvalidUrl {
        /// 입력 URL
        url: String,
        /// 실패 사유
        reason: String,
    },

    /// 연결 또는 WebSocket 핸드셰이크 실패
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        /// 브리지 엔드포인트
        endpoint: String,
        /// 실패 사유
        reason: String,
    },

    /// ready 신호가 제한 시간 안에 오지 않음
    #[error("bus {endpoint} not ready within {timeout:?}")]
    ReadyTimeout {
        /// 브리지 엔드포인트
        endpoint: String,
        /// 대기 상한
        timeout: Duration,
    },

    /// ready 이전에 작업을 요청함
    #[error("bus connection is not ready")]
    NotReady,

    /// 연결이 닫힘
    #[error("bus connection closed: {0}")]
    Closed(String),

    /// 같은 채널에 이미 구독이 있음
    #[error("channel '{0}' is already subscribed on this connection")]
    AlreadySubscribed(String),

    /// 구독하지 않은 채널
    #[error("channel '{0}' is not subscribed")]
    NotSubscribed(String),

    /// 요청에 대한 응답이 제한 시간 안에 오지 않음
    #[error("no reply from '{address}' within {timeout:?}")]
    RequestTimeout {
        /// 요청 대상 주소
        address: String,
        /// 대기 상한
        timeout: Duration,
    },

    /// 브리지가 `err` 프레임을 전달함
    #[error("bus error on '{address}': {message} (code {failure_code:?}, type {failure_type:?})")]
    Remote {
        /// 에러가 발생한 주소
        address: String,
        /// 실패 코드
        failure_code: Option<i64>,
        /// 실패 종류 (RECIPIENT_FAILURE, NO_HANDLERS, TIMEOUT 등)
        failure_type: Option<String>,
        /// 에러 메시지
        message: String,
    },

    /// 프레임 인코딩/디코딩 실패
    #[error("frame error: {0}")]
    Frame(String),

    /// 응답 본문을 도메인 타입으로 변환하지 못함
    #[error("unexpected reply body from '{address}': {reason}")]
    Decode {
        /// 요청 대상 주소
        address: String,
        /// 실패 사유
        reason: String,
    },
}

impl From<EventBusError> for TradespecError {
    fn from(err: EventBusError) -> Self {
        match err {
            EventBusError::RequestTimeout { address, timeout } => TimeoutError {
                condition: format!("reply from '{address}'"),
                attempts: 1,
                elapsed: timeout,
            }
            .into(),
            EventBusError::Connect { endpoint, reason } => {
                ConnectionError::Unreachable { endpoint, reason }.into()
            }
            EventBusError::ReadyTimeout { endpoint, timeout } => ConnectionError::Handshake {
                endpoint,
                reason: format!("not ready within {timeout:?}"),
            }
            .into(),
            EventBusError::Closed(reason) => ConnectionError::Closed(reason).into(),
            EventBusError::Decode { address, reason } => ConnectionError::InvalidResponse {
                endpoint: address,
                reason,
            }
            .into(),
            EventBusError::Remote {
                address,
                failure_type,
                message,
                ..
            } => ConnectionError::Request {
                address,
                reason: match failure_type {
                    Some(kind) => format!("{kind}: {message}"),
                    None => message,
                },
            }
            .into(),
            other => ConnectionError::Request {
                address: "eventbus".to_owned(),
                reason: other.to_string(),
            }
            .into(),
        }
    }
}
