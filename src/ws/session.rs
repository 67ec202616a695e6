//! The session driver: one logical WebSocket connection with explicit
//! lifecycle and reconnect policy.
//!
//! A [`Session`] is a cheap handle over a spawned driver task. The driver
//! owns the transport, the FIFO outbound queue, and the consecutive-failure
//! counter; the handle talks to it over an unbounded command channel and
//! observes its state through a watch channel. All lifecycle events are
//! delivered, in order, to the observer supplied at open time.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};

use crate::base::error::WsError;
use crate::ws::backoff::BackoffPolicy;
use crate::ws::endpoint::Endpoint;
use crate::ws::event::{Event, EventSink, Observer};
use crate::ws::message::{CloseCode, Message};
use crate::ws::state::SessionState;

/// Type alias for the WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Best-effort budget for flushing the close frame at teardown.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Verify TLS certificates on `wss` endpoints (default: true).
    ///
    /// Turning this off is per-session and explicit; nothing here ever
    /// touches process-global TLS state.
    pub tls_verify: bool,
    /// Reconnect after a failed handshake or a dropped transport
    /// (default: true).
    pub reconnect: bool,
    /// Delay policy and attempt budget for reconnects.
    pub backoff: BackoffPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    /// Defaults: verify TLS, reconnect with the default backoff.
    pub fn new() -> Self {
        Self {
            tls_verify: true,
            reconnect: true,
            backoff: BackoffPolicy::default(),
        }
    }

    /// A config that gives up after the first failure.
    pub fn no_reconnect() -> Self {
        Self {
            reconnect: false,
            ..Self::new()
        }
    }
}

/// Commands from the handle to the driver.
enum Command {
    Send(Bytes),
    Close { code: CloseCode, reason: String },
}

/// What the driver needs to start; held by the handle until `open`.
struct DriverSeed {
    commands: mpsc::UnboundedReceiver<Command>,
    endpoint: Endpoint,
    config: SessionConfig,
}

/// Handle over one logical WebSocket connection.
///
/// `send` and `close` are non-blocking; completion and every lifecycle
/// change arrive as [`Event`]s on the observer. A closed session is
/// terminal: reuse requires a fresh `Session`.
///
/// The handle is not meant for concurrent mutation from multiple
/// callers; serialize `open`/`send`/`close` externally if shared.
pub struct Session {
    commands: mpsc::UnboundedSender<Command>,
    state_tx: Arc<watch::Sender<SessionState>>,
    state_rx: watch::Receiver<SessionState>,
    pending: Option<DriverSeed>,
}

impl Session {
    /// Create an idle session for `endpoint`. No network activity until
    /// [`Session::open`].
    ///
    /// Fails with [`WsError::InvalidEndpoint`] if the endpoint cannot be
    /// turned into a handshake request.
    pub fn new(endpoint: Endpoint, config: SessionConfig) -> Result<Self, WsError> {
        // Surface malformed endpoints synchronously, before any I/O.
        endpoint.client_request()?;

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        Ok(Self {
            commands,
            state_tx: Arc::new(state_tx),
            state_rx,
            pending: Some(DriverSeed {
                commands: commands_rx,
                endpoint,
                config,
            }),
        })
    }

    /// Create a session and start connecting in one step.
    ///
    /// Must be called within a Tokio runtime. The call returns once the
    /// driver is spawned; handshake completion arrives as an
    /// [`Event::Opened`] or [`Event::Error`].
    pub fn connect(
        endpoint: Endpoint,
        config: SessionConfig,
        observer: impl Observer + 'static,
    ) -> Result<Self, WsError> {
        let mut session = Self::new(endpoint, config)?;
        session.open(observer)?;
        Ok(session)
    }

    /// Start connecting, delivering lifecycle events to `observer`.
    ///
    /// Fails with [`WsError::AlreadyConnected`] if a connection is
    /// already active on this session, or [`WsError::SessionClosed`] if
    /// the session was closed before it ever opened.
    pub fn open(&mut self, observer: impl Observer + 'static) -> Result<(), WsError> {
        if self.state().is_terminal() {
            return Err(WsError::SessionClosed);
        }
        let seed = self.pending.take().ok_or(WsError::AlreadyConnected)?;

        let driver = Driver {
            endpoint: seed.endpoint,
            config: seed.config,
            state: self.state_tx.clone(),
            commands: seed.commands,
            outbound: VecDeque::new(),
            failures: 0,
            sink: EventSink::new(observer),
        };
        self.state_tx.send_replace(SessionState::Connecting);
        tokio::spawn(driver.run());
        Ok(())
    }

    /// Enqueue `payload` for transmission.
    ///
    /// Succeeds in any non-terminal state; payloads queued while not
    /// connected are flushed FIFO once the connection is (re-)established.
    /// Payloads still queued when the session closes are dropped and
    /// reported through an [`WsError::SendDropped`] error event. The one
    /// exception is a session closed before it ever opened: no observer
    /// is registered yet, so the drop goes unreported.
    pub fn send(&self, payload: impl Into<Bytes>) -> Result<(), WsError> {
        if self.state().is_terminal() {
            return Err(WsError::SessionClosed);
        }
        self.commands
            .send(Command::Send(payload.into()))
            .map_err(|_| WsError::SessionClosed)
    }

    /// Close the session: cancel any pending reconnect, flush a close
    /// frame best-effort, and deliver the final [`Event::Closed`].
    ///
    /// Idempotent; closing an already-closed session is a no-op. No
    /// events are delivered after `Closed`. Closing a session that was
    /// never opened emits nothing at all: there is no observer to notify,
    /// and any queued payloads are discarded unreported.
    pub fn close(&self, code: CloseCode, reason: impl Into<String>) {
        if self.state().is_terminal() {
            return;
        }
        if self.pending.is_some() {
            // Never opened: nothing to tear down and no observer to notify.
            self.state_tx.send_replace(SessionState::Closed);
            return;
        }
        let _ = self.commands.send(Command::Close {
            code,
            reason: reason.into(),
        });
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Wait until the session has fully quiesced: the final `Closed`
    /// event has been delivered and the driver has released its socket.
    pub async fn closed(&self) {
        let mut rx = self.state_rx.clone();
        let _ = rx.wait_for(|state| state.is_terminal()).await;
    }
}

/// Outcome of one connect attempt.
enum ConnectOutcome {
    Connected(WsStream),
    Failed(String),
    Shutdown,
}

/// Why a connected transport stopped.
enum SessionFlow {
    Dropped(String),
    Shutdown,
}

/// The spawned task that owns the transport and runs the state machine.
struct Driver {
    endpoint: Endpoint,
    config: SessionConfig,
    state: Arc<watch::Sender<SessionState>>,
    commands: mpsc::UnboundedReceiver<Command>,
    outbound: VecDeque<Bytes>,
    failures: u32,
    sink: EventSink,
}

impl Driver {
    async fn run(mut self) {
        loop {
            match self.connect_phase().await {
                ConnectOutcome::Connected(stream) => match self.connected_phase(stream).await {
                    SessionFlow::Dropped(reason) => {
                        self.sink.emit(Event::Error {
                            error: WsError::TransportClosed {
                                reason: reason.clone(),
                            },
                        });
                        if !self.config.reconnect {
                            self.teardown(None, reason);
                            return;
                        }
                        if !self.wait_backoff().await {
                            return;
                        }
                    }
                    SessionFlow::Shutdown => return,
                },
                ConnectOutcome::Failed(reason) => {
                    self.failures += 1;
                    self.sink.emit(Event::Error {
                        error: WsError::HandshakeFailed {
                            reason: reason.clone(),
                        },
                    });
                    if !self.config.reconnect {
                        self.teardown(None, format!("handshake failed: {reason}"));
                        return;
                    }
                    if !self.config.backoff.allows_attempt(self.failures) {
                        self.sink.emit(Event::Error {
                            error: WsError::MaxAttemptsExhausted {
                                attempts: self.failures,
                            },
                        });
                        self.teardown(None, "reconnect attempts exhausted".into());
                        return;
                    }
                    if !self.wait_backoff().await {
                        return;
                    }
                }
                ConnectOutcome::Shutdown => return,
            }
        }
    }

    /// One handshake attempt, racing the connect against the command
    /// channel so `close()` cancels it and sends keep queuing.
    async fn connect_phase(&mut self) -> ConnectOutcome {
        let request = match self.endpoint.client_request() {
            Ok(request) => request,
            Err(e) => return ConnectOutcome::Failed(e.to_string()),
        };
        let connector = match self.tls_connector() {
            Ok(connector) => connector,
            Err(reason) => return ConnectOutcome::Failed(reason),
        };

        tracing::debug!(url = %self.endpoint.url(), "connecting");
        let mut connect = pin!(connect_async_tls_with_config(
            request, None, false, connector
        ));
        loop {
            tokio::select! {
                result = &mut connect => {
                    return match result {
                        Ok((stream, _response)) => {
                            self.failures = 0;
                            self.transition(SessionState::Connected);
                            self.sink.emit(Event::Opened);
                            ConnectOutcome::Connected(stream)
                        }
                        Err(e) => {
                            tracing::debug!("handshake failed: {e}");
                            ConnectOutcome::Failed(e.to_string())
                        }
                    };
                }
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(payload)) => self.outbound.push_back(payload),
                    Some(Command::Close { code, reason }) => {
                        self.teardown(Some(code), reason);
                        return ConnectOutcome::Shutdown;
                    }
                    None => {
                        self.teardown(None, "session handle dropped".into());
                        return ConnectOutcome::Shutdown;
                    }
                },
            }
        }
    }

    /// Pump the connected transport: flush the queue, then forward
    /// incoming data frames to the observer and outgoing sends to the
    /// socket until something stops.
    async fn connected_phase(&mut self, stream: WsStream) -> SessionFlow {
        let (mut ws_tx, mut ws_rx) = stream.split();

        // Flush payloads queued while not connected, in send order.
        while let Some(payload) = self.outbound.pop_front() {
            if let Err(e) = ws_tx
                .send(tungstenite::Message::Binary(payload.to_vec()))
                .await
            {
                // Not delivered; keep it at the head for the next connect.
                self.outbound.push_front(payload);
                return SessionFlow::Dropped(e.to_string());
            }
        }

        loop {
            tokio::select! {
                incoming = ws_rx.next() => match incoming {
                    Some(Ok(raw)) => {
                        let msg = Message::from(raw);
                        if let Message::Close(frame) = msg {
                            let reason = frame
                                .map(|f| format!("closed by remote ({}): {}", f.code.0, f.reason))
                                .unwrap_or_else(|| "closed by remote".to_string());
                            tracing::debug!("{reason}");
                            return SessionFlow::Dropped(reason);
                        }
                        if let Some(payload) = msg.into_payload() {
                            self.sink.emit(Event::MessageReceived { payload });
                        }
                        // Ping/pong are answered by the transport.
                    }
                    Some(Err(e)) => {
                        tracing::debug!("transport error: {e}");
                        return SessionFlow::Dropped(e.to_string());
                    }
                    None => return SessionFlow::Dropped("stream ended".into()),
                },
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(payload)) => {
                        if let Err(e) = ws_tx
                            .send(tungstenite::Message::Binary(payload.to_vec()))
                            .await
                        {
                            self.outbound.push_front(payload);
                            return SessionFlow::Dropped(e.to_string());
                        }
                    }
                    Some(Command::Close { code, reason }) => {
                        self.transition(SessionState::Closing);
                        let frame = tungstenite::protocol::CloseFrame {
                            code: code.0.into(),
                            reason: reason.clone().into(),
                        };
                        let flush = ws_tx.send(tungstenite::Message::Close(Some(frame)));
                        if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, flush).await.is_err() {
                            tracing::debug!("close frame flush timed out");
                        }
                        self.teardown(Some(code), reason);
                        return SessionFlow::Shutdown;
                    }
                    None => {
                        self.transition(SessionState::Closing);
                        let flush = ws_tx.send(tungstenite::Message::Close(None));
                        let _ = tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, flush).await;
                        self.teardown(None, "session handle dropped".into());
                        return SessionFlow::Shutdown;
                    }
                },
            }
        }
    }

    /// Sit out the backoff delay, still queuing sends and honoring
    /// `close()`. Returns false if the session shut down while waiting.
    async fn wait_backoff(&mut self) -> bool {
        self.transition(SessionState::Reconnecting);
        let delay = self.config.backoff.delay_for(self.failures.max(1));
        tracing::debug!(?delay, failures = self.failures, "reconnecting after backoff");

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                () = &mut sleep => {
                    self.transition(SessionState::Connecting);
                    return true;
                }
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(payload)) => self.outbound.push_back(payload),
                    Some(Command::Close { code, reason }) => {
                        self.teardown(Some(code), reason);
                        return false;
                    }
                    None => {
                        self.teardown(None, "session handle dropped".into());
                        return false;
                    }
                },
            }
        }
    }

    /// Final accounting: report undelivered payloads, deliver exactly
    /// one `Closed`, and mark the state terminal. The transport (if any)
    /// was dropped by the caller before this point.
    fn teardown(&mut self, code: Option<CloseCode>, reason: String) {
        self.transition(SessionState::Closing);
        self.commands.close();

        let mut dropped = self.outbound.len();
        while let Ok(cmd) = self.commands.try_recv() {
            if matches!(cmd, Command::Send(_)) {
                dropped += 1;
            }
        }
        self.outbound.clear();

        if dropped > 0 {
            tracing::debug!(dropped, "undelivered payloads at teardown");
            self.sink.emit(Event::Error {
                error: WsError::SendDropped { count: dropped },
            });
        }
        self.sink.emit(Event::Closed { code, reason });
        self.transition(SessionState::Closed);
    }

    fn tls_connector(&self) -> Result<Option<Connector>, String> {
        if self.config.tls_verify || !self.endpoint.is_secure() {
            return Ok(None);
        }
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Some(Connector::NativeTls(tls)))
    }

    fn transition(&self, next: SessionState) {
        let current = *self.state.borrow();
        if current == next {
            return;
        }
        if !current.can_transition_to(next) {
            tracing::warn!("invalid session transition {current} -> {next}");
            return;
        }
        tracing::debug!("session state: {current} -> {next}");
        self.state.send_replace(next);
    }
}
