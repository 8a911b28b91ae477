//! 이벤트 버퍼 -- 테스트 케이스별 수신 페이로드 저장소
//!
//! [`EventBuffer`]는 구독 수집기가 수신한 페이로드를 도착 순서대로 보관합니다.
//!
//! # 동시성 모델
//! - 쓰기: 수집기 하나만 [`EventBuffer::push`]를 호출합니다.
//! - 읽기: 폴링 대기자와 스키마 검증기가 [`EventBuffer::len`],
//!   [`EventBuffer::snapshot`]으로 읽습니다.
//!
//! 내부 저장소는 `tokio::sync::watch` 채널이므로 await 지점을 넘어 락을
//! 잡는 일이 없고, 읽기 측이 메시지 전달을 막지 않습니다.
//! 버퍼는 줄어들지 않으며 테스트 케이스가 끝나면 drop됩니다.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

/// 도착 순서를 보존하는 append-only 페이로드 버퍼
///
/// `Clone`은 같은 저장소를 공유하는 핸들을 만듭니다.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    name: Arc<str>,
    inner: Arc<watch::Sender<Vec<Value>>>,
}

impl EventBuffer {
    /// 새 이벤트 버퍼를 생성합니다.
    ///
    /// `name`은 로그와 에러 메시지에서 버퍼를 식별합니다 (예: 채널 이름).
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            name: Arc::from(name.into()),
            inner: Arc::new(tx),
        }
    }

    /// 버퍼 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 페이로드를 끝에 추가합니다.
    pub fn push(&self, payload: Value) {
        self.inner.send_modify(|items| items.push(payload));
    }

    /// 현재 저장된 페이로드 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// 버퍼가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// 현재 내용을 복사한 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> Vec<Value> {
        self.inner.borrow().clone()
    }

    /// 현재 내용을 잠깐 빌려 `f`를 적용합니다.
    ///
    /// 복사 없이 조건을 평가할 때 사용합니다. `f` 안에서 await 하거나
    /// 같은 버퍼에 `push` 하면 안 됩니다.
    pub fn inspect<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// 버퍼 변경을 관찰하는 수신기를 반환합니다.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Value>> {
        self.inner.subscribe()
    }
}
