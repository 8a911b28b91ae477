//! 포트폴리오 서비스 프록시
//!
//! 서비스 프록시 규약: `service.portfolio` 주소로 `send` 프레임을 보내고,
//! 호출할 메서드는 `action` 헤더에 담습니다. 응답은 `replyAddress`로 옵니다.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use tradespec_core::types::Portfolio;

use crate::client::EventBus;
use crate::error::EventBusError;

/// 포트폴리오 조회 메서드 이름
pub const GET_PORTFOLIO: &str = "getPortfolio";

/// 포트폴리오 서비스 프록시
#[derive(Debug, Clone)]
pub struct PortfolioService {
    bus: EventBus,
    address: String,
    timeout: Duration,
}

impl PortfolioService {
    /// 새 프록시를 생성합니다. 응답 대기 상한은 연결 옵션의 `request_timeout`입니다.
    pub fn new(bus: EventBus, address: impl Into<String>) -> Self {
        let timeout = bus.options().request_timeout;
        Self {
            bus,
            address: address.into(),
            timeout,
        }
    }

    /// 응답 대기 상한을 바꿉니다.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 서비스 주소
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 현재 포트폴리오를 조회합니다.
    pub async fn get_portfolio(&self) -> Result<Portfolio, EventBusError> {
        let body = self.get_portfolio_raw().await?;
        serde_json::from_value(body).map_err(|e| EventBusError::Decode {
            address: self.address.clone(),
            reason: e.to_string(),
        })
    }

    /// 현재 포트폴리오를 디코딩 없이 조회합니다.
    pub async fn get_portfolio_raw(&self) -> Result<Value, EventBusError> {
        let body = self
            .bus
            .request(&self.address, Some(GET_PORTFOLIO), json!({}), self.timeout)
            .await?;
        debug!(address = self.address.as_str(), "portfolio received");
        Ok(body)
    }
}
