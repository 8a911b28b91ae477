//! 구독 수집기 -- 채널 전달을 이벤트 버퍼에 누적합니다.
//!
//! [`SubscriptionCollector`]는 [`Subscription`] 하나를 소비하며, 성공 전달은
//! 도착 순서대로 [`EventBuffer`]에 추가하고 에러 전달은 로그와 카운터만 남기고
//! 버립니다. 버퍼를 변경하는 유일한 경로입니다.
//!
//! 자체 tokio 태스크에서 실행되며, 취소 신호를 받거나 구독이 닫히면
//! 종료하고 [`CollectorStats`]를 반환합니다.

use metrics::counter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tradespec_core::buffer::EventBuffer;
use tradespec_core::metrics as m;

use crate::client::Subscription;

/// 수집기 종료 시점의 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// 버퍼에 추가한 페이로드 수
    pub received: u64,
    /// 에러 전달로 버린 수
    pub dropped: u64,
}

/// 구독 수집기
#[derive(Debug)]
pub struct SubscriptionCollector {
    subscription: Subscription,
    buffer: EventBuffer,
    stats: CollectorStats,
}

impl SubscriptionCollector {
    /// 새 수집기를 생성합니다.
    pub fn new(subscription: Subscription, buffer: EventBuffer) -> Self {
        Self {
            subscription,
            buffer,
            stats: CollectorStats::default(),
        }
    }

    /// 수집 대상 버퍼
    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// 수집기를 실행합니다.
    ///
    /// 구독이 닫히거나 `cancel`이 발동되면 종료합니다.
    pub async fn run(mut self, cancel: CancellationToken) -> CollectorStats {
        let channel = self.subscription.address().to_owned();
        info!(channel = channel.as_str(), buffer = self.buffer.name(), "collector started");

        loop {
            tokio::select! {
                delivery = self.subscription.recv() => match delivery {
                    Some(Ok(payload)) => {
                        self.buffer.push(payload);
                        self.stats.received += 1;
                        debug!(
                            channel = channel.as_str(),
                            buffered = self.buffer.len(),
                            "payload buffered"
                        );
                    }
                    Some(Err(e)) => {
                        self.stats.dropped += 1;
                        counter!(m::BUS_MESSAGES_DROPPED_TOTAL, m::LABEL_CHANNEL => channel.clone())
                            .increment(1);
                        warn!(channel = channel.as_str(), error = %e, "dropping bus error delivery");
                    }
                    None => {
                        info!(channel = channel.as_str(), "subscription closed, stopping collector");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    debug!(channel = channel.as_str(), "collector cancelled");
                    break;
                }
            }
        }

        info!(
            channel = channel.as_str(),
            received = self.stats.received,
            dropped = self.stats.dropped,
            "collector stopped"
        );
        self.stats
    }

    /// 수집기를 별도 태스크로 실행합니다.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<CollectorStats> {
        tokio::spawn(self.run(cancel))
    }
}
