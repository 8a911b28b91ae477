#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`client`]: 브리지 연결, 구독, 요청/응답 ([`EventBus`], [`Subscription`])
//! - [`collector`]: 구독 전달을 [`tradespec_core::EventBuffer`]에 누적
//! - [`portfolio`]: `service.portfolio` 서비스 프록시
//! - [`frame`]: 브리지 JSON 프레임
//! - [`error`]: 도메인 에러 타입
//! - [`testing`]: 통합 테스트용 브리지 서버 ([`testing::MockBridge`])
//!
//! # 아키텍처
//!
//! ```text
//! bridge --ws--> ConnectionTask --mpsc--> Subscription --> SubscriptionCollector --> EventBuffer
//!                     ^
//!                     +-- commands (subscribe / request / publish) <-- EventBus handles
//! ```

pub mod client;
pub mod collector;
pub mod error;
pub mod frame;
pub mod portfolio;

pub mod testing;

// --- 주요 타입 re-export ---

pub use client::{BusOptions, ConnectionState, Delivery, EventBus, Subscription, websocket_url};
pub use collector::{CollectorStats, SubscriptionCollector};
pub use error::EventBusError;
pub use frame::BridgeFrame;
pub use portfolio::PortfolioService;
