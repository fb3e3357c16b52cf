//! Connection management for the relay server
//!
//! The session orchestrator only ever talks to a [`Connection`]. Multiplayer uses
//! [`WebSocketConnection`], which runs the socket on a tokio task and hands inbound
//! events to the main loop through a bounded queue; singleplayer uses
//! [`OfflineConnection`], which accepts everything and never produces an event.

use crate::config::ClientConfig;
use crate::error::NetworkError;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, LeaderboardEntry, PeerId, RosterSnapshot, ServerMessage};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound messages waiting for the socket writer; anything beyond this is dropped
const OUTBOUND_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Inbound notifications, delivered in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Connected,
    Disconnected,
    IdentityAssigned(PeerId),
    RosterSnapshot(RosterSnapshot),
    LevelAdvance,
    Leaderboard(Vec<LeaderboardEntry>),
}

/// Transport session as seen from the main loop. No method blocks.
pub trait Connection {
    /// Starts the session in the background
    fn connect(&mut self);

    /// Fire-and-forget; silently dropped unless connected
    fn send(&self, message: ClientMessage);

    /// Tears the session down and cancels reconnection. Safe to call repeatedly.
    fn disconnect(&mut self);

    fn state(&self) -> ConnectionState;

    fn poll_event(&mut self) -> Option<NetworkEvent>;

    /// Takes every event queued so far
    fn drain_events(&mut self) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.poll_event() {
            events.push(event);
        }
        events
    }
}

/// Stand-in for singleplayer sessions
#[derive(Debug, Default)]
pub struct OfflineConnection;

impl OfflineConnection {
    pub fn new() -> Self {
        Self
    }
}

impl Connection for OfflineConnection {
    fn connect(&mut self) {}

    fn send(&self, _message: ClientMessage) {}

    fn disconnect(&mut self) {}

    fn state(&self) -> ConnectionState {
        ConnectionState::Disconnected
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        None
    }
}

/// Timing policy for a live link
#[derive(Debug, Clone, Copy)]
pub struct LinkSettings {
    pub reconnect_delay: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub event_queue_capacity: usize,
}

impl From<&ClientConfig> for LinkSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay,
            heartbeat_interval: config.heartbeat_interval,
            heartbeat_timeout: config.heartbeat_timeout,
            event_queue_capacity: config.event_queue_capacity.max(1),
        }
    }
}

/// WebSocket session with unlimited fixed-delay reconnection and a ping keep-alive
pub struct WebSocketConnection {
    url: String,
    settings: LinkSettings,
    runtime: Handle,
    state_rx: watch::Receiver<ConnectionState>,
    outbound_tx: Option<mpsc::Sender<ClientMessage>>,
    events_rx: Option<mpsc::Receiver<NetworkEvent>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WebSocketConnection {
    pub fn new(url: impl Into<String>, settings: LinkSettings, runtime: Handle) -> Self {
        let (_, state_rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            url: url.into(),
            settings,
            runtime,
            state_rx,
            outbound_tx: None,
            events_rx: None,
            shutdown_tx: None,
            task: None,
        }
    }

    pub fn from_config(config: &ClientConfig, runtime: Handle) -> Self {
        Self::new(config.server_url.clone(), LinkSettings::from(config), runtime)
    }

    /// True while the background task is alive, including while it waits to reconnect
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Connection for WebSocketConnection {
    fn connect(&mut self) {
        if self.shutdown_tx.is_some() {
            debug!("Connection to {} already started", self.url);
            return;
        }

        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (events_tx, events_rx) = mpsc::channel(self.settings.event_queue_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let link = Link {
            url: self.url.clone(),
            settings: self.settings,
            events: events_tx,
            outbound: outbound_rx,
            state: state_tx,
        };

        info!("Connecting to {}", self.url);
        self.task = Some(self.runtime.spawn(link.run(shutdown_rx)));
        self.state_rx = state_rx;
        self.events_rx = Some(events_rx);
        self.outbound_tx = Some(outbound_tx);
        self.shutdown_tx = Some(shutdown_tx);
    }

    fn send(&self, message: ClientMessage) {
        if self.state() != ConnectionState::Connected {
            return;
        }
        if let Some(outbound) = &self.outbound_tx {
            if let Err(e) = outbound.try_send(message) {
                debug!("Dropping outbound message: {}", e);
            }
        }
    }

    fn disconnect(&mut self) {
        self.outbound_tx = None;
        if let Some(shutdown) = self.shutdown_tx.take() {
            info!("Disconnecting from {}", self.url);
            let _ = shutdown.send(());
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        self.events_rx.as_mut()?.try_recv().ok()
    }
}

impl Drop for WebSocketConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

enum SessionEnd {
    Shutdown,
    Lost(NetworkError),
}

/// Background half of a [`WebSocketConnection`]
struct Link {
    url: String,
    settings: LinkSettings,
    events: mpsc::Sender<NetworkEvent>,
    outbound: mpsc::Receiver<ClientMessage>,
    state: watch::Sender<ConnectionState>,
}

impl Link {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            self.state.send_replace(ConnectionState::Connecting);

            let attempt = tokio::select! {
                result = connect_async(self.url.as_str()) => result,
                _ = &mut shutdown => break,
            };

            match attempt {
                Ok((socket, _)) => {
                    info!("Connected to {}", self.url);
                    // Updates queued for the previous session are stale
                    while self.outbound.try_recv().is_ok() {}

                    self.state.send_replace(ConnectionState::Connected);
                    let end = if self.emit(NetworkEvent::Connected, &mut shutdown).await {
                        self.session(socket, &mut shutdown).await
                    } else {
                        let mut socket = socket;
                        if let Err(e) = socket.close(None).await {
                            debug!("Close frame not delivered: {}", e);
                        }
                        SessionEnd::Shutdown
                    };

                    self.state.send_replace(ConnectionState::Disconnected);
                    match end {
                        SessionEnd::Shutdown => {
                            // Nobody waits for this one, so never block on a full queue
                            if let Err(e) = self.events.try_send(NetworkEvent::Disconnected) {
                                debug!("Final disconnect event dropped: {}", e);
                            }
                            break;
                        }
                        SessionEnd::Lost(e) => {
                            warn!("Connection to {} lost: {}", self.url, e);
                            if !self.emit(NetworkEvent::Disconnected, &mut shutdown).await {
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!("{}", NetworkError::Connect(e)),
            }

            self.state.send_replace(ConnectionState::Disconnected);
            debug!("Reconnecting in {:?}", self.settings.reconnect_delay);
            tokio::select! {
                _ = sleep(self.settings.reconnect_delay) => {},
                _ = &mut shutdown => break,
            }
        }

        self.state.send_replace(ConnectionState::Disconnected);
        info!("Connection task for {} stopped", self.url);
    }

    async fn session(
        &mut self,
        socket: Socket,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> SessionEnd {
        let (mut sink, mut source) = socket.split();
        let timeout = self.settings.heartbeat_timeout;

        let mut heartbeat = interval(self.settings.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        heartbeat.tick().await;

        let silence = sleep(timeout);
        tokio::pin!(silence);

        loop {
            tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(message)) => {
                        silence.as_mut().reset(Instant::now() + timeout);
                        match message {
                            Message::Text(text) => {
                                if !self.handle_frame(&text, shutdown).await {
                                    close(&mut sink).await;
                                    return SessionEnd::Shutdown;
                                }
                            }
                            Message::Close(_) => {
                                return SessionEnd::Lost(NetworkError::ClosedByPeer);
                            }
                            _ => {}
                        }
                    }
                    Some(Err(e)) => return SessionEnd::Lost(NetworkError::Transport(e)),
                    None => return SessionEnd::Lost(NetworkError::ClosedByPeer),
                },

                Some(message) = self.outbound.recv() => {
                    let text = match message.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("{}", NetworkError::Encode(e));
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        return SessionEnd::Lost(NetworkError::Transport(e));
                    }
                },

                _ = heartbeat.tick() => {
                    if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                        return SessionEnd::Lost(NetworkError::Transport(e));
                    }
                },

                _ = &mut silence => {
                    return SessionEnd::Lost(NetworkError::HeartbeatTimeout(timeout));
                },

                _ = &mut *shutdown => {
                    close(&mut sink).await;
                    return SessionEnd::Shutdown;
                },
            }
        }
    }

    /// Returns false when shutdown was requested while the event waited for queue space
    async fn handle_frame(&mut self, text: &str, shutdown: &mut oneshot::Receiver<()>) -> bool {
        let event = match ServerMessage::decode(text) {
            Ok(ServerMessage::YourId(id)) => {
                info!("Assigned identity {}", id);
                NetworkEvent::IdentityAssigned(id)
            }
            Ok(ServerMessage::PlayerUpdate(snapshot)) => NetworkEvent::RosterSnapshot(snapshot),
            Ok(ServerMessage::AdvanceLevel) => NetworkEvent::LevelAdvance,
            Ok(ServerMessage::LeaderboardUpdate(entries)) => NetworkEvent::Leaderboard(entries),
            Err(e) => {
                warn!("Ignoring frame: {}", e);
                return true;
            }
        };
        self.emit(event, shutdown).await
    }

    /// Waits for queue space unless shutdown arrives first, in which case returns false.
    /// The shutdown receiver must not be polled again after that.
    async fn emit(&self, event: NetworkEvent, shutdown: &mut oneshot::Receiver<()>) -> bool {
        tokio::select! {
            result = self.events.send(event) => {
                if result.is_err() {
                    debug!("Event receiver dropped");
                }
                true
            }
            _ = shutdown => false,
        }
    }
}

async fn close(sink: &mut SplitSink<Socket, Message>) {
    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!("Close frame not delivered: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PeerState;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    fn fast_settings() -> LinkSettings {
        LinkSettings {
            reconnect_delay: Duration::from_millis(20),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
            event_queue_capacity: 8,
        }
    }

    #[test]
    fn test_offline_connection_is_inert() {
        let mut connection = OfflineConnection::new();
        connection.connect();
        connection.send(ClientMessage::AdvanceLevel);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.poll_event().is_none());
        assert!(connection.drain_events().is_empty());
        connection.disconnect();
        connection.disconnect();
    }

    #[test]
    fn test_settings_from_config() {
        let config = ClientConfig {
            event_queue_capacity: 0,
            ..ClientConfig::default()
        };
        let settings = LinkSettings::from(&config);
        assert_eq!(settings.reconnect_delay, Duration::from_secs(1));
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(settings.heartbeat_timeout, Duration::from_secs(90));
        assert_eq!(settings.event_queue_capacity, 1);
    }

    #[tokio::test]
    async fn test_idle_connection_drops_sends() {
        let mut connection =
            WebSocketConnection::new("ws://127.0.0.1:9", fast_settings(), Handle::current());

        assert_eq!(connection.state(), ConnectionState::Disconnected);
        connection.send(ClientMessage::AdvanceLevel);
        assert!(connection.poll_event().is_none());
        assert!(!connection.is_active());

        connection.disconnect();
        connection.disconnect();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stale_outbound_discarded_on_new_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let (events_tx, mut events_rx) = mpsc::channel(8);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        // Left over from a session that never got to write it
        outbound_tx
            .try_send(ClientMessage::PlayerUpdate(PeerState {
                x: 1.0,
                y: 2.0,
                username: "stale".to_string(),
                score: 0,
            }))
            .unwrap();

        let link = Link {
            url,
            settings: fast_settings(),
            events: events_tx,
            outbound: outbound_rx,
            state: state_tx,
        };
        let task = tokio::spawn(link.run(shutdown_rx));

        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        assert_eq!(events_rx.recv().await, Some(NetworkEvent::Connected));
        assert_eq!(*state_rx.borrow(), ConnectionState::Connected);

        outbound_tx.try_send(ClientMessage::AdvanceLevel).unwrap();
        let first = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break ClientMessage::decode(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("Link closed before sending: {:?}", other),
            }
        };
        assert_eq!(first, ClientMessage::AdvanceLevel);

        shutdown_tx.send(()).unwrap();
        task.await.unwrap();
        assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_disconnect_cancels_reconnect_loop() {
        // Nothing listens on the discard port, so every attempt fails and retries
        let mut connection =
            WebSocketConnection::new("ws://127.0.0.1:9", fast_settings(), Handle::current());
        connection.connect();
        assert!(connection.is_active());
        assert_ne!(connection.state(), ConnectionState::Connected);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(connection.is_active());
        assert_ne!(connection.state(), ConnectionState::Connected);

        connection.disconnect();
        let deadline = Instant::now() + Duration::from_secs(2);
        while connection.is_active() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(!connection.is_active());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.drain_events().is_empty());
        connection.disconnect();
    }
}
