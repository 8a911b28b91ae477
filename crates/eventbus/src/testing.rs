//! 테스트용 브리지 서버
//!
//! 로컬 포트에서 SockJS 브리지의 raw WebSocket 엔드포인트를 흉내 냅니다.
//! 받은 프레임을 기록하고, 테스트가 지시한 `rec` / `err` 프레임을 모든
//! 연결에 보내며, `send` 요청에는 미리 등록한 응답을 돌려줍니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::frame::BridgeFrame;

/// `send` 요청에 대한 응답
#[derive(Debug, Clone)]
pub enum MockReply {
    /// `rec` 프레임으로 본문을 돌려줌
    Body(Value),
    /// `err` 프레임으로 실패를 돌려줌
    Failure {
        code: i64,
        kind: String,
        message: String,
    },
}

#[derive(Default)]
struct Shared {
    received: Mutex<Vec<BridgeFrame>>,
    replies: Mutex<HashMap<String, MockReply>>,
}

impl Shared {
    fn record(&self, frame: BridgeFrame) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame);
    }

    fn respond(&self, frame: &BridgeFrame) -> Option<BridgeFrame> {
        match frame {
            BridgeFrame::Send {
                address,
                reply_address: Some(reply_address),
                ..
            } => {
                let replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
                match replies.get(address)? {
                    MockReply::Body(body) => Some(BridgeFrame::rec(reply_address, body.clone())),
                    MockReply::Failure {
                        code,
                        kind,
                        message,
                    } => Some(BridgeFrame::Error {
                        address: Some(reply_address.clone()),
                        failure_code: Some(*code),
                        failure_type: Some(kind.clone()),
                        message: Some(message.clone()),
                        body: None,
                    }),
                }
            }
            BridgeFrame::Ping => Some(BridgeFrame::Pong),
            _ => None,
        }
    }
}

/// 테스트용 브리지 서버
pub struct MockBridge {
    addr: SocketAddr,
    shared: Arc<Shared>,
    outbound: broadcast::Sender<String>,
    cancel: CancellationToken,
}

impl MockBridge {
    /// `127.0.0.1`의 임의 포트에서 서버를 시작합니다.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (outbound, _) = broadcast::channel(1024);
        let shared = Arc::new(Shared::default());
        let cancel = CancellationToken::new();

        tokio::spawn(accept_loop(
            listener,
            Arc::clone(&shared),
            outbound.clone(),
            cancel.clone(),
        ));

        Ok(Self {
            addr,
            shared,
            outbound,
            cancel,
        })
    }

    /// 서버 주소
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// 대시보드 루트 URL (`http://127.0.0.1:port/`)
    pub fn dashboard_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// 브리지 URL (`http://127.0.0.1:port/eventbus/`)
    pub fn bridge_url(&self) -> Url {
        let text = format!("http://{}/eventbus/", self.addr);
        Url::parse(&text).unwrap_or_else(|e| panic!("mock bridge url '{text}': {e}"))
    }

    /// 연결된 모든 클라이언트에 `rec` 프레임을 보냅니다.
    pub fn publish(&self, address: &str, body: Value) {
        self.broadcast(&BridgeFrame::rec(address, body));
    }

    /// 연결된 모든 클라이언트에 `err` 프레임을 보냅니다.
    pub fn fail(&self, address: &str, kind: &str, message: &str) {
        self.broadcast(&BridgeFrame::Error {
            address: Some(address.to_owned()),
            failure_code: Some(-1),
            failure_type: Some(kind.to_owned()),
            message: Some(message.to_owned()),
            body: None,
        });
    }

    /// 임의의 원시 텍스트 메시지를 보냅니다.
    pub fn send_raw(&self, text: &str) {
        let _ = self.outbound.send(text.to_owned());
    }

    /// `address`로 온 `send` 요청에 돌려줄 응답을 등록합니다.
    pub fn reply_to(&self, address: &str, reply: MockReply) {
        self.shared
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.to_owned(), reply);
    }

    /// 지금까지 받은 프레임
    pub fn received(&self) -> Vec<BridgeFrame> {
        self.shared
            .received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 조건을 만족하는 프레임이 도착할 때까지 최대 `timeout` 동안 기다립니다.
    pub async fn wait_for_frame(
        &self,
        timeout: Duration,
        predicate: impl Fn(&BridgeFrame) -> bool,
    ) -> Option<BridgeFrame> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = self.received().into_iter().find(|f| predicate(f)) {
                return Some(frame);
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// `address`의 `register` 프레임을 기다립니다.
    pub async fn wait_for_registration(&self, address: &str, timeout: Duration) -> bool {
        self.wait_for_frame(timeout, |f| {
            matches!(f, BridgeFrame::Register { address: a, .. } if a == address)
        })
        .await
        .is_some()
    }

    /// 모든 연결을 닫고 새 연결을 받지 않습니다.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn broadcast(&self, frame: &BridgeFrame) {
        if let Ok(text) = frame.encode() {
            let _ = self.outbound.send(text);
        }
    }
}

impl Drop for MockBridge {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    shared: Arc<Shared>,
    outbound: broadcast::Sender<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    // 핸드셰이크 완료 전에 구독해야 ready 직후 발행도 전달됨
                    let rx = outbound.subscribe();
                    tokio::spawn(serve(stream, Arc::clone(&shared), rx, cancel.clone()));
                }
                Err(_) => break,
            },
        }
    }
}

async fn serve(
    stream: TcpStream,
    shared: Arc<Shared>,
    mut outbound: broadcast::Receiver<String>,
    cancel: CancellationToken,
) {
    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            text = outbound.recv() => match text {
                Ok(text) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let Ok(frame) = BridgeFrame::decode(&text) else {
                        continue;
                    };
                    let response = shared.respond(&frame);
                    shared.record(frame);
                    if let Some(text) = response.and_then(|r| r.encode().ok()) {
                        if sink.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
