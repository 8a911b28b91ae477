//! 브리지 프레임 -- SockJS 이벤트 버스 브리지의 JSON 메시지
//!
//! WebSocket 텍스트 메시지 하나가 프레임 하나입니다. `type` 필드로 구분합니다.
//!
//! | 방향 | type | 용도 |
//! |------|------|------|
//! | 송신 | `register` / `unregister` | 주소 구독 등록/해제 |
//! | 송신 | `send` | 점대점 전송 (`replyAddress`가 있으면 요청) |
//! | 송신 | `publish` | 브로드캐스트 |
//! | 송신 | `ping` | 연결 유지 |
//! | 수신 | `rec` | 메시지 전달 (구독 또는 응답) |
//! | 수신 | `err` | 실패 전달 |
//! | 수신 | `pong` | ping 응답 |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventBusError;

/// 서비스 프록시가 호출할 메서드를 담는 헤더 키
pub const ACTION_HEADER: &str = "action";

/// 브리지 프레임
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BridgeFrame {
    /// 주소 구독 등록
    Register {
        address: String,
        #[serde(default)]
        headers: Map<String, Value>,
    },

    /// 주소 구독 해제
    Unregister {
        address: String,
        #[serde(default)]
        headers: Map<String, Value>,
    },

    /// 점대점 전송
    Send {
        address: String,
        #[serde(default)]
        body: Value,
        #[serde(default)]
        headers: Map<String, Value>,
        #[serde(
            rename = "replyAddress",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        reply_address: Option<String>,
    },

    /// 브로드캐스트
    Publish {
        address: String,
        #[serde(default)]
        body: Value,
        #[serde(default)]
        headers: Map<String, Value>,
    },

    /// 연결 유지
    Ping,

    /// ping 응답
    Pong,

    /// 메시지 전달
    Rec {
        address: String,
        #[serde(default)]
        body: Value,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        headers: Map<String, Value>,
        #[serde(
            rename = "replyAddress",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        reply_address: Option<String>,
    },

    /// 실패 전달
    #[serde(rename = "err")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        #[serde(
            rename = "failureCode",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        failure_code: Option<i64>,
        #[serde(
            rename = "failureType",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        failure_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// 접근 거부 등 일부 에러는 `message` 대신 `body`에 사유를 담습니다.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
}

impl BridgeFrame {
    /// `register` 프레임
    pub fn register(address: impl Into<String>) -> Self {
        Self::Register {
            address: address.into(),
            headers: Map::new(),
        }
    }

    /// `unregister` 프레임
    pub fn unregister(address: impl Into<String>) -> Self {
        Self::Unregister {
            address: address.into(),
            headers: Map::new(),
        }
    }

    /// 응답 주소가 있는 `send` 프레임 (요청)
    ///
    /// `action`이 있으면 서비스 프록시 규약대로 `action` 헤더에 담습니다.
    pub fn request(
        address: impl Into<String>,
        action: Option<&str>,
        body: Value,
        reply_address: impl Into<String>,
    ) -> Self {
        let mut headers = Map::new();
        if let Some(action) = action {
            headers.insert(ACTION_HEADER.to_owned(), Value::String(action.to_owned()));
        }
        Self::Send {
            address: address.into(),
            body,
            headers,
            reply_address: Some(reply_address.into()),
        }
    }

    /// `publish` 프레임
    pub fn publish(address: impl Into<String>, body: Value) -> Self {
        Self::Publish {
            address: address.into(),
            body,
            headers: Map::new(),
        }
    }

    /// `rec` 프레임
    pub fn rec(address: impl Into<String>, body: Value) -> Self {
        Self::Rec {
            address: address.into(),
            body,
            headers: Map::new(),
            reply_address: None,
        }
    }

    /// 프레임 종류 이름 (로그용)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Unregister { .. } => "unregister",
            Self::Send { .. } => "send",
            Self::Publish { .. } => "publish",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Rec { .. } => "rec",
            Self::Error { .. } => "err",
        }
    }

    /// JSON 텍스트로 인코딩합니다.
    pub fn encode(&self) -> Result<String, EventBusError> {
        serde_json::to_string(self).map_err(|e| EventBusError::Frame(e.to_string()))
    }

    /// JSON 텍스트에서 디코딩합니다.
    pub fn decode(text: &str) -> Result<Self, EventBusError> {
        serde_json::from_str(text).map_err(|e| EventBusError::Frame(e.to_string()))
    }

    /// `err` 프레임을 [`EventBusError::Remote`]로 변환합니다.
    ///
    /// 다른 종류의 프레임이면 `None`을 반환합니다.
    pub fn into_remote_error(self, fallback_address: &str) -> Option<EventBusError> {
        match self {
            Self::Error {
                address,
                failure_code,
                failure_type,
                message,
                body,
            } => Some(EventBusError::Remote {
                address: address.unwrap_or_else(|| fallback_address.to_owned()),
                failure_code,
                failure_type,
                message: message
                    .or_else(|| body.map(|b| b.as_str().map_or_else(|| b.to_string(), str::to_owned)))
                    .unwrap_or_else(|| "unknown error".to_owned()),
            }),
            _ => None,
        }
    }
}
