//! 이벤트 버스 클라이언트 -- SockJS 브리지에 WebSocket으로 연결합니다.
//!
//! # 구조
//! [`EventBus::open`]은 연결 태스크를 spawn하고 즉시 반환합니다.
//! 연결 태스크는 WebSocket 하나를 소유하며, 다음을 `tokio::select!`로 처리합니다.
//!
//! - 핸들에서 온 명령 (구독, 해제, 요청, 발행)
//! - 브리지에서 온 프레임 (`rec`, `err`, `pong`)
//! - 주기적인 `ping`
//! - 취소 신호
//!
//! 핸들([`EventBus`], [`Subscription`])은 bounded `mpsc` 채널로 명령을 보내고
//! `oneshot`으로 결과를 받습니다. 연결 상태는 `watch` 채널로 공유합니다.
//!
//! # ready 신호
//! `open`은 핸드셰이크를 기다리지 않습니다. [`EventBus::ready`]로 상한 시간 안에
//! 연결이 열리기를 기다린 뒤 구독/요청해야 합니다. ready 이전 요청은
//! [`EventBusError::NotReady`]로 거부됩니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;
use uuid::Uuid;

use tradespec_core::config::BusConfig;
use tradespec_core::metrics as m;

use crate::error::EventBusError;
use crate::frame::BridgeFrame;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// 구독으로 전달되는 항목: 페이로드 또는 브리지 에러
pub type Delivery = Result<Value, EventBusError>;

/// 핸들 → 연결 태스크 명령 큐 크기
const COMMAND_CAPACITY: usize = 64;

/// 연결 옵션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusOptions {
    /// 핸드셰이크 상한
    pub open_timeout: Duration,
    /// [`crate::PortfolioService`] 등 요청의 기본 응답 대기 상한
    pub request_timeout: Duration,
    /// `ping` 프레임 전송 간격
    pub ping_interval: Duration,
    /// 구독별 전달 큐 크기
    pub channel_capacity: usize,
}

impl Default for BusOptions {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(5),
            channel_capacity: 1024,
        }
    }
}

impl BusOptions {
    /// `[bus]` 설정 섹션에서 옵션을 만듭니다.
    pub fn from_config(config: &BusConfig) -> Self {
        Self {
            open_timeout: config.open_timeout(),
            request_timeout: config.request_timeout(),
            ping_interval: config.ping_interval(),
            channel_capacity: config.channel_capacity,
        }
    }
}

/// 연결 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// 핸드셰이크 진행 중
    Connecting,
    /// 연결됨
    Open,
    /// 한 번도 열리지 못하고 실패함
    Failed(String),
    /// 열렸다가 닫힘
    Closed(String),
}

impl ConnectionState {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Closed(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
            Self::Closed(reason) => write!(f, "closed ({reason})"),
        }
    }
}

/// 대시보드의 브리지 URL에서 raw WebSocket URL을 만듭니다.
///
/// `http://host/eventbus/` → `ws://host/eventbus/websocket`,
/// `https` → `wss`. 이미 `/websocket`으로 끝나면 스킴만 바꿉니다.
pub fn websocket_url(base: &Url) -> Result<Url, EventBusError> {
    let invalid = |reason: String| EventBusError::InvalidUrl {
        url: base.to_string(),
        reason,
    };

    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot switch scheme to {scheme}")))?;

    if url.path().ends_with("/websocket") {
        return Ok(url);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.join("websocket").map_err(|e| invalid(e.to_string()))
}

enum Command {
    Subscribe {
        address: String,
        deliveries: mpsc::Sender<Delivery>,
        reply: oneshot::Sender<Result<(), EventBusError>>,
    },
    Unsubscribe {
        address: String,
        reply: oneshot::Sender<Result<(), EventBusError>>,
    },
    Request {
        target: String,
        reply_address: String,
        frame: BridgeFrame,
        reply: oneshot::Sender<Result<Value, EventBusError>>,
    },
    Publish {
        frame: BridgeFrame,
        reply: oneshot::Sender<Result<(), EventBusError>>,
    },
    /// 타임아웃된 요청의 응답 대기를 정리
    Forget { reply_address: String },
}

fn task_stopped() -> EventBusError {
    EventBusError::Closed("connection task stopped".to_owned())
}

/// 이벤트 버스 연결 핸들
///
/// `Clone`은 같은 연결을 공유합니다. 모든 핸들과 구독이 drop되면 연결 태스크도
/// 종료됩니다.
#[derive(Clone)]
pub struct EventBus {
    endpoint: Arc<str>,
    options: BusOptions,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("endpoint", &self.endpoint)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// 브리지에 연결을 시작합니다.
    ///
    /// `url`은 대시보드의 브리지 URL (`http://host:8000/eventbus/`) 또는
    /// WebSocket URL입니다. 핸드셰이크는 백그라운드에서 진행되며 결과는
    /// [`EventBus::ready`]로 확인합니다. tokio 런타임 안에서 호출해야 합니다.
    pub fn open(url: &Url, options: BusOptions) -> Result<Self, EventBusError> {
        let endpoint = websocket_url(url)?;
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();

        let task = ConnectionTask {
            endpoint: endpoint.to_string(),
            options: options.clone(),
            commands: command_rx,
            state: state_tx,
            subscriptions: HashMap::new(),
            pending: HashMap::new(),
        };
        tokio::spawn(task.run(cancel.clone()));

        info!(endpoint = %endpoint, "opening event bus connection");
        Ok(Self {
            endpoint: Arc::from(endpoint.as_str()),
            options,
            commands: command_tx,
            state: state_rx,
            cancel,
        })
    }

    /// WebSocket 엔드포인트
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 연결 옵션
    pub fn options(&self) -> &BusOptions {
        &self.options
    }

    /// 현재 연결 상태
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// 연결이 열릴 때까지 최대 `timeout` 동안 기다립니다.
    pub async fn ready(&self, timeout: Duration) -> Result<(), EventBusError> {
        let mut state = self.state.clone();
        let waited = tokio::time::timeout(timeout, async {
            state
                .wait_for(|s| *s != ConnectionState::Connecting)
                .await
                .map(|s| (*s).clone())
        })
        .await;

        match waited {
            Ok(Ok(ConnectionState::Open)) => {
                debug!(endpoint = %self.endpoint, "event bus ready");
                Ok(())
            }
            Ok(Ok(ConnectionState::Failed(reason))) => Err(EventBusError::Connect {
                endpoint: self.endpoint.to_string(),
                reason,
            }),
            Ok(Ok(ConnectionState::Closed(reason))) => Err(EventBusError::Closed(reason)),
            Ok(Err(_)) => Err(task_stopped()),
            Err(_) | Ok(Ok(ConnectionState::Connecting)) => Err(EventBusError::ReadyTimeout {
                endpoint: self.endpoint.to_string(),
                timeout,
            }),
        }
    }

    /// 채널을 구독합니다.
    ///
    /// 연결당 채널 하나에 구독 하나만 허용합니다. 같은 채널을 다시 구독하면
    /// [`EventBusError::AlreadySubscribed`]를 반환합니다. 이전 [`Subscription`]이
    /// drop된 뒤라면 새 구독이 그 자리를 이어받습니다.
    pub async fn subscribe(&self, channel: &str) -> Result<Subscription, EventBusError> {
        self.ensure_open()?;
        let (tx, rx) = mpsc::channel(self.options.channel_capacity);
        self.call(|reply| Command::Subscribe {
            address: channel.to_owned(),
            deliveries: tx,
            reply,
        })
        .await?;

        debug!(channel, "subscribed");
        Ok(Subscription {
            address: channel.to_owned(),
            deliveries: rx,
            commands: self.commands.clone(),
        })
    }

    /// 채널 구독을 해제합니다.
    pub async fn unsubscribe(&self, channel: &str) -> Result<(), EventBusError> {
        self.ensure_open()?;
        unsubscribe_via(&self.commands, channel).await
    }

    /// 요청을 보내고 응답 본문을 기다립니다.
    ///
    /// `action`은 서비스 프록시 규약의 `action` 헤더로 전달됩니다. 응답 주소는
    /// 요청마다 새 UUID로 만듭니다.
    pub async fn request(
        &self,
        address: &str,
        action: Option<&str>,
        body: Value,
        timeout: Duration,
    ) -> Result<Value, EventBusError> {
        self.ensure_open()?;
        let reply_address = Uuid::new_v4().to_string();
        let frame = BridgeFrame::request(address, action, body, reply_address.clone());
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Request {
                target: address.to_owned(),
                reply_address: reply_address.clone(),
                frame,
                reply,
            })
            .await
            .map_err(|_| task_stopped())?;

        let started = Instant::now();
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => {
                histogram!(m::BUS_REQUEST_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
                result
            }
            Ok(Err(_)) => Err(task_stopped()),
            Err(_) => {
                let _ = self.commands.try_send(Command::Forget { reply_address });
                warn!(address, action, ?timeout, "bus request timed out");
                Err(EventBusError::RequestTimeout {
                    address: address.to_owned(),
                    timeout,
                })
            }
        }
    }

    /// 주소로 메시지를 발행합니다.
    pub async fn publish(&self, address: &str, body: Value) -> Result<(), EventBusError> {
        self.ensure_open()?;
        self.call(|reply| Command::Publish {
            frame: BridgeFrame::publish(address, body),
            reply,
        })
        .await
    }

    /// 연결을 닫고 연결 태스크가 끝날 때까지 기다립니다.
    ///
    /// 열린 구독의 전달 채널은 닫히고, 대기 중인 요청은
    /// [`EventBusError::Closed`]로 끝납니다.
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut state = self.state.clone();
        let _ = state.wait_for(ConnectionState::is_terminal).await;
    }

    fn ensure_open(&self) -> Result<(), EventBusError> {
        match &*self.state.borrow() {
            ConnectionState::Open => Ok(()),
            ConnectionState::Connecting => Err(EventBusError::NotReady),
            ConnectionState::Failed(reason) | ConnectionState::Closed(reason) => {
                Err(EventBusError::Closed(reason.clone()))
            }
        }
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, EventBusError>>) -> Command,
    ) -> Result<T, EventBusError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| task_stopped())?;
        rx.await.map_err(|_| task_stopped())?
    }
}

async fn unsubscribe_via(
    commands: &mpsc::Sender<Command>,
    channel: &str,
) -> Result<(), EventBusError> {
    let (reply, rx) = oneshot::channel();
    commands
        .send(Command::Unsubscribe {
            address: channel.to_owned(),
            reply,
        })
        .await
        .map_err(|_| task_stopped())?;
    rx.await.map_err(|_| task_stopped())?
}

/// 채널 구독 핸들
///
/// 전달 순서는 브리지에서 도착한 순서와 같습니다. drop하면 다음 전달 시점에
/// 연결 태스크가 구독을 해제합니다.
pub struct Subscription {
    address: String,
    deliveries: mpsc::Receiver<Delivery>,
    commands: mpsc::Sender<Command>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// 구독한 채널 주소
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 다음 전달을 기다립니다. 연결이 닫히면 `None`을 반환합니다.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.deliveries.recv().await
    }

    /// 구독을 명시적으로 해제합니다.
    pub async fn unsubscribe(self) -> Result<(), EventBusError> {
        unsubscribe_via(&self.commands, &self.address).await
    }
}

struct PendingRequest {
    target: String,
    reply: oneshot::Sender<Result<Value, EventBusError>>,
}

/// WebSocket 하나를 소유하는 연결 태스크
struct ConnectionTask {
    endpoint: String,
    options: BusOptions,
    commands: mpsc::Receiver<Command>,
    state: watch::Sender<ConnectionState>,
    subscriptions: HashMap<String, mpsc::Sender<Delivery>>,
    pending: HashMap<String, PendingRequest>,
}

impl ConnectionTask {
    async fn run(mut self, cancel: CancellationToken) {
        let endpoint = self.endpoint.clone();
        let connect = tokio::time::timeout(
            self.options.open_timeout,
            tokio_tungstenite::connect_async(endpoint.as_str()),
        );

        let ws = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.finish(ConnectionState::Failed("closed before open".to_owned()));
                return;
            }
            result = connect => match result {
                Ok(Ok((ws, _response))) => ws,
                Ok(Err(e)) => {
                    warn!(endpoint = %self.endpoint, error = %e, "event bus connection failed");
                    self.finish(ConnectionState::Failed(e.to_string()));
                    return;
                }
                Err(_) => {
                    warn!(endpoint = %self.endpoint, timeout = ?self.options.open_timeout, "event bus handshake timed out");
                    self.finish(ConnectionState::Failed(format!(
                        "handshake not completed within {:?}",
                        self.options.open_timeout
                    )));
                    return;
                }
            }
        };

        info!(endpoint = %self.endpoint, "event bus connection open");
        self.state.send_replace(ConnectionState::Open);

        let (mut sink, mut stream) = ws.split();
        let mut ping = tokio::time::interval_at(
            Instant::now() + self.options.ping_interval,
            self.options.ping_interval,
        );
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                _ = cancel.cancelled() => break "closed by client".to_owned(),
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break "all handles dropped".to_owned();
                    };
                    if let Err(e) = self.handle_command(command, &mut sink).await {
                        break e.to_string();
                    }
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.dispatch(&text, &mut sink).await {
                            break e.to_string();
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break match frame {
                            Some(frame) => format!("closed by server: {} {}", frame.code, frame.reason),
                            None => "closed by server".to_owned(),
                        };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break e.to_string(),
                    None => break "stream ended".to_owned(),
                },
                _ = ping.tick() => {
                    if let Err(e) = send_frame(&mut sink, &BridgeFrame::Ping).await {
                        break e.to_string();
                    }
                    trace!(endpoint = %self.endpoint, "ping sent");
                }
            }
        };

        let _ = sink.close().await;
        info!(endpoint = %self.endpoint, reason = reason.as_str(), "event bus connection closed");
        self.finish(ConnectionState::Closed(reason));
    }

    fn finish(&mut self, state: ConnectionState) {
        let reason = state.to_string();
        // 상태를 먼저 바꿔야 전달 채널이 닫힌 뒤의 관찰자가 종료 상태를 봄
        self.state.send_replace(state);
        for (_, pending) in self.pending.drain() {
            let _ = pending
                .reply
                .send(Err(EventBusError::Closed(reason.clone())));
        }
        self.subscriptions.clear();
    }

    async fn handle_command(
        &mut self,
        command: Command,
        sink: &mut WsSink,
    ) -> Result<(), EventBusError> {
        match command {
            Command::Subscribe {
                address,
                deliveries,
                reply,
            } => {
                if let Some(existing) = self.subscriptions.get_mut(&address) {
                    if existing.is_closed() {
                        // 이전 구독이 drop됨: 등록은 유지하고 전달 대상만 교체
                        *existing = deliveries;
                        let _ = reply.send(Ok(()));
                    } else {
                        let _ = reply.send(Err(EventBusError::AlreadySubscribed(address)));
                    }
                    return Ok(());
                }
                let sent = send_frame(sink, &BridgeFrame::register(&address)).await;
                if sent.is_ok() {
                    self.subscriptions.insert(address, deliveries);
                }
                relay(reply, sent)
            }
            Command::Unsubscribe { address, reply } => {
                if self.subscriptions.remove(&address).is_none() {
                    let _ = reply.send(Err(EventBusError::NotSubscribed(address)));
                    return Ok(());
                }
                let sent = send_frame(sink, &BridgeFrame::unregister(&address)).await;
                debug!(channel = address.as_str(), "unsubscribed");
                relay(reply, sent)
            }
            Command::Request {
                target,
                reply_address,
                frame,
                reply,
            } => {
                self.pending
                    .insert(reply_address.clone(), PendingRequest { target, reply });
                if let Err(e) = send_frame(sink, &frame).await {
                    if let Some(pending) = self.pending.remove(&reply_address) {
                        let _ = pending.reply.send(Err(EventBusError::Closed(e.to_string())));
                    }
                    return Err(e);
                }
                Ok(())
            }
            Command::Publish { frame, reply } => {
                let sent = send_frame(sink, &frame).await;
                relay(reply, sent)
            }
            Command::Forget { reply_address } => {
                self.pending.remove(&reply_address);
                Ok(())
            }
        }
    }

    async fn dispatch(&mut self, text: &str, sink: &mut WsSink) -> Result<(), EventBusError> {
        let frame = match BridgeFrame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "ignoring undecodable bridge frame");
                return Ok(());
            }
        };

        match frame {
            BridgeFrame::Rec { address, body, .. } => {
                if let Some(pending) = self.pending.remove(&address) {
                    let _ = pending.reply.send(Ok(body));
                    return Ok(());
                }
                self.deliver(&address, Ok(body), sink).await
            }
            frame @ BridgeFrame::Error { .. } => self.dispatch_error(frame, sink).await,
            BridgeFrame::Pong => {
                trace!(endpoint = %self.endpoint, "pong received");
                Ok(())
            }
            other => {
                debug!(kind = other.kind(), "ignoring unexpected bridge frame");
                Ok(())
            }
        }
    }

    async fn dispatch_error(
        &mut self,
        frame: BridgeFrame,
        sink: &mut WsSink,
    ) -> Result<(), EventBusError> {
        let address = match &frame {
            BridgeFrame::Error { address, .. } => address.clone(),
            _ => None,
        };

        if let Some(pending) = address.as_deref().and_then(|a| self.pending.remove(a)) {
            if let Some(mut err) = frame.into_remote_error(&pending.target) {
                if let EventBusError::Remote { address, .. } = &mut err {
                    address.clone_from(&pending.target);
                }
                let _ = pending.reply.send(Err(err));
            }
            return Ok(());
        }

        match address {
            Some(address) if self.subscriptions.contains_key(&address) => {
                match frame.into_remote_error(&address) {
                    Some(err) => self.deliver(&address, Err(err), sink).await,
                    None => Ok(()),
                }
            }
            _ => {
                warn!(frame = ?frame, "bridge error without a matching handler");
                Ok(())
            }
        }
    }

    async fn deliver(
        &mut self,
        address: &str,
        delivery: Delivery,
        sink: &mut WsSink,
    ) -> Result<(), EventBusError> {
        let Some(tx) = self.subscriptions.get(address) else {
            debug!(address, "no handler for delivery, ignoring");
            return Ok(());
        };

        match tx.try_send(delivery) {
            Ok(()) => {
                counter!(m::BUS_MESSAGES_RECEIVED_TOTAL, m::LABEL_CHANNEL => address.to_owned())
                    .increment(1);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                counter!(m::BUS_MESSAGES_DROPPED_TOTAL, m::LABEL_CHANNEL => address.to_owned())
                    .increment(1);
                warn!(address, "subscriber queue full, dropping delivery");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => {
                self.subscriptions.remove(address);
                debug!(address, "subscription dropped, unregistering");
                send_frame(sink, &BridgeFrame::unregister(address)).await
            }
        }
    }
}

async fn send_frame(sink: &mut WsSink, frame: &BridgeFrame) -> Result<(), EventBusError> {
    let text = frame.encode()?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| EventBusError::Closed(e.to_string()))
}

/// 전송 결과를 호출자에게 돌려주고, 실패면 연결 태스크도 멈추도록 에러를 반환합니다.
fn relay(
    reply: oneshot::Sender<Result<(), EventBusError>>,
    sent: Result<(), EventBusError>,
) -> Result<(), EventBusError> {
    match sent {
        Ok(()) => {
            let _ = reply.send(Ok(()));
            Ok(())
        }
        Err(e) => {
            let _ = reply.send(Err(EventBusError::Closed(e.to_string())));
            Err(e)
        }
    }
}
