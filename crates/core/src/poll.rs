//! 폴링 조건 대기 -- 고정 간격으로 조건을 평가하고 상한 횟수에서 멈춥니다.
//!
//! # 평가 시점
//! 첫 평가는 **즉시** (t = 0) 수행하고, 이후 `interval`마다 한 번씩 평가합니다.
//! 마지막 실패 평가 뒤에는 대기하지 않으므로, 타임아웃은
//! `(max_attempts - 1) × interval` 시점에 보고됩니다.
//!
//! # 취소
//! [`poll_until`]이 반환한 future를 drop하면 더 이상 평가하지 않습니다.
//! 콜백 형태의 [`wait`]는 `CancellationToken`을 받아, 취소 이후에는
//! 어떤 콜백도 호출하지 않습니다.

use std::time::Duration;

use metrics::counter;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::PollingConfig;
use crate::error::{ConfigError, TimeoutError};
use crate::metrics as m;

/// 폴링 설정 (간격, 최대 평가 횟수, 조건 설명)
///
/// 대기 작업마다 생성하고 완료 후 버립니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDescriptor {
    condition: String,
    interval: Duration,
    max_attempts: u32,
}

impl PollDescriptor {
    /// 새 폴링 설정을 생성합니다.
    ///
    /// `max_attempts`가 0이면 평가가 한 번도 일어나지 않으므로 거부합니다.
    pub fn new(
        condition: impl Into<String>,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.max_attempts".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(Self {
            condition: condition.into(),
            interval,
            max_attempts,
        })
    }

    /// `[polling]` 설정 섹션에서 폴링 설정을 만듭니다.
    pub fn from_config(
        condition: impl Into<String>,
        config: &PollingConfig,
    ) -> Result<Self, ConfigError> {
        Self::new(condition, config.interval(), config.max_attempts)
    }

    /// 조건 설명
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// 평가 간격
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 최대 평가 횟수
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// 조건 충족 시점의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult<T> {
    /// 조건을 충족시킨 스냅샷
    pub value: T,
    /// 충족까지 수행한 평가 횟수 (1부터)
    pub attempts: u32,
    /// 첫 평가부터 충족까지 경과 시간
    pub elapsed: Duration,
}

/// 조건이 충족될 때까지 `probe`를 반복 평가합니다.
///
/// `probe`가 `Some(snapshot)`을 반환하면 즉시 멈추고 그 스냅샷을 돌려줍니다.
/// `max_attempts`번 모두 `None`이면 [`TimeoutError`]를 반환합니다.
/// `probe`는 await 없이 동기적으로 평가되므로 공유 상태의 락을
/// await 지점 너머로 잡지 않습니다.
pub async fn poll_until<T, F>(
    descriptor: &PollDescriptor,
    mut probe: F,
) -> Result<PollResult<T>, TimeoutError>
where
    F: FnMut() -> Option<T>,
{
    let started = Instant::now();
    let mut attempts = 0_u32;

    loop {
        attempts += 1;
        counter!(m::POLL_ATTEMPTS_TOTAL).increment(1);

        if let Some(value) = probe() {
            let elapsed = started.elapsed();
            debug!(
                condition = descriptor.condition.as_str(),
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "poll condition met"
            );
            return Ok(PollResult {
                value,
                attempts,
                elapsed,
            });
        }

        if attempts >= descriptor.max_attempts {
            let elapsed = started.elapsed();
            counter!(m::POLL_TIMEOUTS_TOTAL).increment(1);
            warn!(
                condition = descriptor.condition.as_str(),
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "poll condition not met, giving up"
            );
            return Err(TimeoutError {
                condition: descriptor.condition.clone(),
                attempts,
                elapsed,
            });
        }

        trace!(
            condition = descriptor.condition.as_str(),
            attempts, "poll condition not met yet"
        );
        tokio::time::sleep(descriptor.interval).await;
    }
}

/// 폴링 결과를 받는 관찰자
///
/// 두 콜백 중 정확히 하나가 최대 한 번 호출됩니다. 취소되면 어느 쪽도
/// 호출되지 않습니다.
pub trait PollObserver<T> {
    /// 조건이 충족됨
    fn on_success(&mut self, result: PollResult<T>);

    /// 최대 평가 횟수를 모두 소진함
    fn on_timeout(&mut self, error: TimeoutError);
}

/// [`wait`]의 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// `on_success`가 호출됨
    Succeeded,
    /// `on_timeout`이 호출됨
    TimedOut,
    /// 취소되어 아무 콜백도 호출되지 않음
    Cancelled,
}

/// 콜백 형태의 폴링 대기
///
/// `cancel`이 발동되면 다음 평가를 예약하지 않고 [`PollOutcome::Cancelled`]를
/// 반환합니다.
pub async fn wait<T, F, O>(
    descriptor: &PollDescriptor,
    cancel: &CancellationToken,
    probe: F,
    observer: &mut O,
) -> PollOutcome
where
    F: FnMut() -> Option<T>,
    O: PollObserver<T> + ?Sized,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(condition = descriptor.condition.as_str(), "poll cancelled");
            PollOutcome::Cancelled
        }
        result = poll_until(descriptor, probe) => match result {
            Ok(result) => {
                observer.on_success(result);
                PollOutcome::Succeeded
            }
            Err(error) => {
                observer.on_timeout(error);
                PollOutcome::TimedOut
            }
        }
    }
}
