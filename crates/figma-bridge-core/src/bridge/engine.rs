//! Correlation engine between tool calls and the plugin socket.
//!
//! A single task owns the connection, the pending-request table and the
//! heartbeat. Everything that can change that state arrives as an
//! [`EngineEvent`] on one mailbox: socket callbacks, command calls, deadline
//! expiries, heartbeat ticks and shutdown. Processing events one at a time is
//! the only synchronization, so there are no locks around the table.
//!
//! # State machine
//!
//! ```text
//! disconnected --accept--> connecting --handshake--> connected
//!       ^                      |                         |
//!       +------ close / supersede / shutdown ------------+
//! ```
//!
//! Leaving `connecting` or `connected` always runs the same teardown:
//! document metadata cleared, heartbeat stopped, every pending request
//! failed with `CONNECTION_CLOSED`, and a `Disconnected` event emitted.

use super::heartbeat;
use super::pending::{Completion, PendingRequest, PendingTable};
use super::protocol::{self, InboundFrame};
use super::state::{BridgeEvent, BridgeStatus, ConnectionState};
use super::transport::{CloseReason, ConnectionId, EndpointHandle, PeerEvents, PeerLink, SocketEndpoint};
use crate::config::BridgeConfig;
use crate::{BridgeError, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle events buffered for the facade before the oldest are dropped.
const EVENT_BUFFER: usize = 64;

/// Timing knobs for the engine. Defaults come from [`BridgeConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub request_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub port_scan_range: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: BridgeConfig::REQUEST_TIMEOUT,
            heartbeat_interval: BridgeConfig::HEARTBEAT_INTERVAL,
            port_scan_range: BridgeConfig::PORT_SCAN_RANGE,
        }
    }
}

pub(crate) enum EngineEvent {
    Accepted(PeerLink),
    Frame {
        connection: ConnectionId,
        text: String,
    },
    Closed(ConnectionId),
    Errored {
        connection: ConnectionId,
        message: String,
    },
    Call {
        command: String,
        payload: Value,
        completion: Completion,
    },
    Deadline {
        request_id: String,
    },
    HeartbeatTick {
        connection: ConnectionId,
    },
    Shutdown {
        done: Option<oneshot::Sender<()>>,
    },
}

/// Routes transport callbacks into the engine mailbox.
struct MailboxEvents {
    mailbox: mpsc::UnboundedSender<EngineEvent>,
}

impl PeerEvents for MailboxEvents {
    fn on_connect(&self, link: PeerLink) {
        let _ = self.mailbox.send(EngineEvent::Accepted(link));
    }

    fn on_message(&self, connection: ConnectionId, text: String) {
        let _ = self.mailbox.send(EngineEvent::Frame { connection, text });
    }

    fn on_close(&self, connection: ConnectionId) {
        let _ = self.mailbox.send(EngineEvent::Closed(connection));
    }

    fn on_error(&self, connection: ConnectionId, message: String) {
        let _ = self.mailbox.send(EngineEvent::Errored { connection, message });
    }
}

/// Handle to the correlation engine.
///
/// Constructed once by the binary and shared by `Arc`. Dropping it shuts
/// the engine down and fails any outstanding commands.
pub struct Bridge {
    mailbox: mpsc::UnboundedSender<EngineEvent>,
    status: watch::Receiver<BridgeStatus>,
    events: Mutex<Option<mpsc::Receiver<BridgeEvent>>>,
    endpoint: Mutex<Option<EndpointHandle>>,
    config: EngineConfig,
}

impl Bridge {
    /// Spawn the engine task. Must be called from within a tokio runtime.
    pub fn new(config: EngineConfig) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(BridgeStatus::default());
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        let engine = Engine {
            config: config.clone(),
            mailbox: mailbox.downgrade(),
            status: status_tx,
            events: events_tx,
            state: ConnectionState::Disconnected,
            link: None,
            document: None,
            heartbeat: None,
            pending: PendingTable::default(),
        };
        tokio::spawn(engine.run(inbox));

        Self {
            mailbox,
            status,
            events: Mutex::new(Some(events_rx)),
            endpoint: Mutex::new(None),
            config,
        }
    }

    /// Transport callbacks wired to this engine.
    pub fn peer_events(&self) -> Arc<dyn PeerEvents> {
        Arc::new(MailboxEvents {
            mailbox: self.mailbox.clone(),
        })
    }

    /// Start listening for the plugin. Returns the bound port.
    ///
    /// Calling it again while listening returns the existing port.
    pub async fn start(&self, host: &str, preferred_port: u16) -> Result<u16> {
        if let Some(port) = self.port() {
            return Ok(port);
        }
        let handle = SocketEndpoint::listen(
            host,
            preferred_port,
            self.config.port_scan_range,
            self.peer_events(),
        )
        .await?;
        let port = handle.port;
        *self.endpoint_slot() = Some(handle);
        Ok(port)
    }

    /// Port the endpoint is bound to, if started.
    pub fn port(&self) -> Option<u16> {
        self.endpoint_slot().as_ref().map(|handle| handle.port)
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Handshake metadata of the connected document.
    pub fn document_info(&self) -> Option<Value> {
        self.status.borrow().document.clone()
    }

    /// Number of commands awaiting a reply.
    pub fn pending_requests(&self) -> usize {
        self.status.borrow().pending
    }

    /// Watch the engine's status snapshot.
    pub fn subscribe(&self) -> watch::Receiver<BridgeStatus> {
        self.status.clone()
    }

    /// Take the lifecycle event receiver. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::Receiver<BridgeEvent>> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Send a command to the plugin and wait for its reply.
    ///
    /// Fails immediately with `NOT_CONNECTED` unless a handshake has
    /// completed. Otherwise resolves exactly once: with the reply payload,
    /// the plugin's own error, `TIMEOUT`, or `CONNECTION_CLOSED`.
    pub async fn send_command(&self, command: &str, payload: Value) -> Result<Value> {
        if !self.is_connected() {
            return Err(BridgeError::NotConnected);
        }

        let (completion, outcome) = oneshot::channel();
        self.mailbox
            .send(EngineEvent::Call {
                command: command.to_string(),
                payload,
                completion,
            })
            .map_err(|_| BridgeError::NotConnected)?;

        outcome
            .await
            .unwrap_or(Err(BridgeError::ConnectionClosed))
    }

    /// Close the plugin connection, fail pending commands and stop listening.
    pub async fn stop(&self) {
        let endpoint = self.endpoint_slot().take();
        if let Some(mut handle) = endpoint {
            handle.close();
        }

        let (done, finished) = oneshot::channel();
        if self
            .mailbox
            .send(EngineEvent::Shutdown { done: Some(done) })
            .is_ok()
        {
            let _ = finished.await;
        }
    }

    fn endpoint_slot(&self) -> MutexGuard<'_, Option<EndpointHandle>> {
        self.endpoint.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        let _ = self.mailbox.send(EngineEvent::Shutdown { done: None });
    }
}

struct Engine {
    config: EngineConfig,
    mailbox: mpsc::WeakUnboundedSender<EngineEvent>,
    status: watch::Sender<BridgeStatus>,
    events: mpsc::Sender<BridgeEvent>,
    state: ConnectionState,
    link: Option<PeerLink>,
    document: Option<Value>,
    heartbeat: Option<AbortHandle>,
    pending: PendingTable,
}

impl Engine {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<EngineEvent>) {
        while let Some(event) = inbox.recv().await {
            let stop = match event {
                EngineEvent::Accepted(link) => {
                    self.accept(link);
                    None
                }
                EngineEvent::Frame { connection, text } => {
                    self.frame(connection, &text);
                    None
                }
                EngineEvent::Closed(connection) => {
                    if self.is_current(connection) {
                        info!("Plugin connection {} closed", connection);
                        self.teardown();
                    } else {
                        debug!("Ignoring close of superseded connection {}", connection);
                    }
                    None
                }
                EngineEvent::Errored { connection, message } => {
                    error!("WebSocket error on {}: {}", connection, message);
                    self.emit(BridgeEvent::Error { message });
                    None
                }
                EngineEvent::Call {
                    command,
                    payload,
                    completion,
                } => {
                    self.call(command, payload, completion);
                    None
                }
                EngineEvent::Deadline { request_id } => {
                    if self.pending.expire(&request_id, self.config.request_timeout) {
                        warn!("Request {} timed out", request_id);
                    }
                    None
                }
                EngineEvent::HeartbeatTick { connection } => {
                    self.heartbeat_tick(connection);
                    None
                }
                EngineEvent::Shutdown { done } => {
                    if let Some(link) = &self.link {
                        link.close(CloseReason::ServerShutdown);
                    }
                    self.teardown();
                    Some(done)
                }
            };

            self.publish();

            if let Some(done) = stop {
                if let Some(done) = done {
                    let _ = done.send(());
                }
                break;
            }
        }

        if self.link.is_some() {
            self.teardown();
            self.publish();
        }
        debug!("Bridge engine stopped");
    }

    fn is_current(&self, connection: ConnectionId) -> bool {
        self.link.as_ref().map(PeerLink::id) == Some(connection)
    }

    fn accept(&mut self, link: PeerLink) {
        if let Some(previous) = &self.link {
            warn!(
                "Replacing plugin connection {} with {}",
                previous.id(),
                link.id()
            );
            previous.close(CloseReason::Superseded);
            self.teardown();
        }
        debug!("Plugin connection {} awaiting handshake", link.id());
        self.link = Some(link);
        self.state = ConnectionState::Connecting;
    }

    fn frame(&mut self, connection: ConnectionId, text: &str) {
        if !self.is_current(connection) {
            debug!("Dropping frame from superseded connection {}", connection);
            return;
        }

        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to parse plugin message: {}", e);
                return;
            }
        };

        match frame {
            InboundFrame::Handshake { payload } => self.handshake(connection, payload),
            InboundFrame::Pong => {}
            InboundFrame::Reply {
                response_to,
                payload,
            } => {
                let outcome = protocol::reply_outcome(payload);
                if !self.pending.resolve(&response_to, outcome) {
                    debug!("Discarding reply to unknown request {}", response_to);
                }
            }
            InboundFrame::Unknown => debug!("Ignoring unrecognized plugin message"),
        }
    }

    fn handshake(&mut self, connection: ConnectionId, payload: Value) {
        if !payload.is_object() {
            warn!("Dropping handshake without an object payload");
            return;
        }
        if self.state == ConnectionState::Connected {
            info!("Plugin re-sent handshake; refreshing document metadata");
        }

        let file_name = payload
            .get("fileName")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        self.document = Some(payload.clone());
        self.state = ConnectionState::Connected;

        let session_id = format!(
            "{}{}",
            BridgeConfig::SESSION_ID_PREFIX,
            Uuid::new_v4().simple()
        );
        match protocol::handshake_ack(&session_id) {
            Ok(ack) => self.send_current(ack),
            Err(e) => error!("Failed to encode handshake ack: {}", e),
        }

        self.start_heartbeat(connection);
        info!("Handshake complete: {}", file_name);
        self.emit(BridgeEvent::Connected { document: payload });
    }

    fn call(&mut self, command: String, payload: Value, completion: Completion) {
        if self.state != ConnectionState::Connected {
            let _ = completion.send(Err(BridgeError::NotConnected));
            return;
        }

        let request_id = self.pending.next_id();
        let frame = match protocol::command(&request_id, &command, &payload) {
            Ok(frame) => frame,
            Err(e) => {
                let _ = completion.send(Err(e));
                return;
            }
        };

        debug!("Sending {} as {}", command, request_id);
        let deadline = self.spawn_deadline(request_id.clone());
        self.pending.insert(
            request_id,
            PendingRequest {
                command,
                completion,
                deadline,
            },
        );
        // A dead socket is followed by a close event, which fails the request.
        self.send_current(frame);
    }

    fn heartbeat_tick(&mut self, connection: ConnectionId) {
        if self.state != ConnectionState::Connected || !self.is_current(connection) {
            return;
        }
        match protocol::ping() {
            Ok(ping) => self.send_current(ping),
            Err(e) => error!("Failed to encode ping: {}", e),
        }
    }

    fn teardown(&mut self) {
        let was_attached = self.link.take().is_some();
        self.state = ConnectionState::Disconnected;
        self.document = None;
        self.stop_heartbeat();

        let rejected = self.pending.reject_all();
        if rejected > 0 {
            warn!("Rejected {} pending request(s): connection closed", rejected);
        }
        if was_attached {
            self.emit(BridgeEvent::Disconnected);
        }
    }

    fn send_current(&self, frame: String) {
        if let Some(link) = &self.link {
            if !link.send(frame) {
                debug!("Plugin socket {} is gone; frame dropped", link.id());
            }
        }
    }

    fn spawn_deadline(&self, request_id: String) -> AbortHandle {
        let timeout = self.config.request_timeout;
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(mailbox) = mailbox.upgrade() {
                let _ = mailbox.send(EngineEvent::Deadline { request_id });
            }
        })
        .abort_handle()
    }

    fn start_heartbeat(&mut self, connection: ConnectionId) {
        self.stop_heartbeat();
        self.heartbeat = Some(heartbeat::spawn(
            self.config.heartbeat_interval,
            connection,
            self.mailbox.clone(),
        ));
    }

    fn stop_heartbeat(&mut self) {
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.abort();
        }
    }

    fn emit(&self, event: BridgeEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.events.try_send(event) {
            debug!("Lifecycle event buffer full; dropping {:?}", event);
        }
    }

    fn publish(&self) {
        let next = BridgeStatus {
            state: self.state,
            document: self.document.clone(),
            pending: self.pending.len(),
        };
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::transport::Outbound;
    use serde_json::json;
    use tokio::time::Instant;

    const TIMEOUT: Duration = Duration::from_secs(60);
    const HEARTBEAT: Duration = Duration::from_secs(30);

    fn bridge() -> (Bridge, Arc<dyn PeerEvents>) {
        let bridge = Bridge::new(EngineConfig::default());
        let events = bridge.peer_events();
        (bridge, events)
    }

    async fn wait_state(bridge: &Bridge, state: ConnectionState) {
        bridge
            .subscribe()
            .wait_for(|status| status.state == state)
            .await
            .unwrap();
    }

    async fn wait_pending(bridge: &Bridge, count: usize) {
        bridge
            .subscribe()
            .wait_for(|status| status.pending == count)
            .await
            .unwrap();
    }

    async fn next_text(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Value {
        match rx.recv().await {
            Some(Outbound::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    /// Accept a socket and complete the handshake; returns the writer side.
    async fn connect(
        bridge: &Bridge,
        events: &Arc<dyn PeerEvents>,
        id: u64,
    ) -> mpsc::UnboundedReceiver<Outbound> {
        let (link, mut rx) = PeerLink::channel(ConnectionId(id));
        events.on_connect(link);
        events.on_message(
            ConnectionId(id),
            json!({"type": "handshake", "payload": {"fileName": "Demo", "fileId": "abc"}}).to_string(),
        );
        wait_state(bridge, ConnectionState::Connected).await;
        let ack = next_text(&mut rx).await;
        assert_eq!(ack["type"], "handshake_ack");
        rx
    }

    fn reply(events: &Arc<dyn PeerEvents>, id: u64, request_id: &Value, payload: Value) {
        events.on_message(
            ConnectionId(id),
            json!({"responseTo": request_id, "payload": payload}).to_string(),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_roundtrip_then_not_connected_after_close() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;
        assert_eq!(bridge.document_info().unwrap()["fileName"], "Demo");

        let call = bridge.send_command("ping", json!({}));
        let plugin = async {
            let request = next_text(&mut rx).await;
            assert_eq!(request["command"], "ping");
            assert_eq!(request["payload"], json!({}));
            reply(&events, 1, &request["requestId"], json!({"ok": true}));
        };
        let (result, ()) = tokio::join!(call, plugin);
        assert_eq!(result.unwrap(), json!({"ok": true}));

        events.on_close(ConnectionId(1));
        wait_state(&bridge, ConnectionState::Disconnected).await;
        assert!(bridge.document_info().is_none());

        let err = bridge.send_command("ping", json!({})).await.unwrap_err();
        assert_eq!(err.code(), "NOT_CONNECTED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_replies() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        let calls = async {
            tokio::join!(
                bridge.send_command("a", json!({"n": 1})),
                bridge.send_command("b", json!({"n": 2})),
                bridge.send_command("c", json!({"n": 3})),
            )
        };
        let plugin = async {
            let mut requests = Vec::new();
            for _ in 0..3 {
                requests.push(next_text(&mut rx).await);
            }
            for request in requests.iter().rev() {
                reply(
                    &events,
                    1,
                    &request["requestId"],
                    json!({"echo": request["command"]}),
                );
            }
        };
        let ((a, b, c), ()) = tokio::join!(calls, plugin);

        assert_eq!(a.unwrap(), json!({"echo": "a"}));
        assert_eq!(b.unwrap(), json!({"echo": "b"}));
        assert_eq!(c.unwrap(), json!({"echo": "c"}));
        assert_eq!(bridge.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_connected_while_connecting() {
        let (bridge, events) = bridge();
        let err = bridge.send_command("ping", json!({})).await.unwrap_err();
        assert_eq!(err.code(), "NOT_CONNECTED");

        let (link, mut rx) = PeerLink::channel(ConnectionId(1));
        events.on_connect(link);
        wait_state(&bridge, ConnectionState::Connecting).await;

        let err = bridge.send_command("ping", json!({})).await.unwrap_err();
        assert_eq!(err.code(), "NOT_CONNECTED");
        assert_eq!(bridge.pending_requests(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_requires_object_payload() {
        let (bridge, events) = bridge();
        let (link, mut rx) = PeerLink::channel(ConnectionId(1));
        events.on_connect(link);
        events.on_message(ConnectionId(1), r#"{"type":"handshake","payload":"nope"}"#.into());
        events.on_message(ConnectionId(1), "not json".into());
        wait_state(&bridge, ConnectionState::Connecting).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(bridge.state(), ConnectionState::Connecting);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_error_passthrough() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        let call = bridge.send_command("delete_nodes", json!({"nodeIds": ["1:2"]}));
        let plugin = async {
            let request = next_text(&mut rx).await;
            reply(
                &events,
                1,
                &request["requestId"],
                json!({"error": {"code": "OPERATION_FAILED", "message": "Node not found"}}),
            );
        };
        let (result, ()) = tokio::join!(call, plugin);
        let err = result.unwrap_err();
        assert_eq!(err.code(), "OPERATION_FAILED");
        assert_eq!(err.to_string(), "Node not found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_reply_is_noop() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        reply(&events, 1, &json!("req_999"), json!({"ok": true}));

        let call = bridge.send_command("ping", json!({}));
        let plugin = async {
            let request = next_text(&mut rx).await;
            assert_eq!(request["requestId"], "req_1");
            reply(&events, 1, &request["requestId"], json!({"ok": 1}));
        };
        let (result, ()) = tokio::join!(call, plugin);
        assert_eq!(result.unwrap(), json!({"ok": 1}));
        assert!(bridge.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_reply() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        let started = Instant::now();
        let err = bridge
            .send_command("export_node", json!({"nodeId": "1:1"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(
            err.to_string(),
            "Command \"export_node\" timed out after 60000ms"
        );
        assert!(started.elapsed() >= TIMEOUT);
        assert_eq!(bridge.pending_requests(), 0);

        // Heartbeat pings went out while waiting; find the request itself.
        let mut request_id = None;
        while let Ok(Outbound::Text(text)) = rx.try_recv() {
            let frame: Value = serde_json::from_str(&text).unwrap();
            if frame["command"] == "export_node" {
                request_id = Some(frame["requestId"].clone());
            }
        }
        reply(&events, 1, &request_id.unwrap(), json!({"late": true}));
        tokio::task::yield_now().await;
        assert!(bridge.is_connected());
        assert_eq!(bridge.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_rejects_all_pending() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;
        let mut lifecycle = bridge.take_events().unwrap();
        assert!(bridge.take_events().is_none());

        let calls = async {
            tokio::join!(
                bridge.send_command("a", json!({})),
                bridge.send_command("b", json!({})),
                bridge.send_command("c", json!({})),
            )
        };
        let plugin = async {
            for _ in 0..3 {
                next_text(&mut rx).await;
            }
            wait_pending(&bridge, 3).await;
            events.on_close(ConnectionId(1));
        };
        let ((a, b, c), ()) = tokio::join!(calls, plugin);

        for result in [a, b, c] {
            assert_eq!(result.unwrap_err().code(), "CONNECTION_CLOSED");
        }
        assert_eq!(bridge.pending_requests(), 0);

        assert!(matches!(
            lifecycle.recv().await,
            Some(BridgeEvent::Connected { .. })
        ));
        assert_eq!(lifecycle.recv().await, Some(BridgeEvent::Disconnected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_socket_error_keeps_connection_until_close() {
        let (bridge, events) = bridge();
        let mut lifecycle = bridge.take_events().unwrap();
        let mut rx = connect(&bridge, &events, 1).await;

        let call = bridge.send_command("slow", json!({}));
        let plugin = async {
            next_text(&mut rx).await;
            wait_pending(&bridge, 1).await;
            events.on_error(ConnectionId(1), "connection reset".to_string());

            assert!(matches!(
                lifecycle.recv().await,
                Some(BridgeEvent::Connected { .. })
            ));
            assert_eq!(
                lifecycle.recv().await,
                Some(BridgeEvent::Error {
                    message: "connection reset".to_string()
                })
            );
            // An error alone is diagnostic; the close does the teardown.
            assert_eq!(bridge.state(), ConnectionState::Connected);
            assert_eq!(bridge.pending_requests(), 1);

            events.on_close(ConnectionId(1));
        };
        let (result, ()) = tokio::join!(call, plugin);
        assert_eq!(result.unwrap_err().code(), "CONNECTION_CLOSED");
        assert_eq!(bridge.pending_requests(), 0);
        assert_eq!(lifecycle.recv().await, Some(BridgeEvent::Disconnected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_connection_supersedes_old() {
        let (bridge, events) = bridge();
        let mut lifecycle = bridge.take_events().unwrap();
        let mut first = connect(&bridge, &events, 1).await;

        let call = bridge.send_command("slow", json!({}));
        let plugin = async {
            next_text(&mut first).await;
            let (link, _second) = PeerLink::channel(ConnectionId(2));
            events.on_connect(link);
            wait_state(&bridge, ConnectionState::Connecting).await;
        };
        let (result, ()) = tokio::join!(call, plugin);
        assert_eq!(result.unwrap_err().code(), "CONNECTION_CLOSED");

        assert_eq!(
            first.recv().await,
            Some(Outbound::Close(CloseReason::Superseded))
        );

        assert!(matches!(
            lifecycle.recv().await,
            Some(BridgeEvent::Connected { .. })
        ));
        assert_eq!(lifecycle.recv().await, Some(BridgeEvent::Disconnected));

        // The old socket's close arrives later and must not disturb the new one.
        events.on_close(ConnectionId(1));
        events.on_message(
            ConnectionId(2),
            json!({"type": "handshake", "payload": {"fileName": "Next"}}).to_string(),
        );
        wait_state(&bridge, ConnectionState::Connected).await;
        assert_eq!(bridge.document_info().unwrap()["fileName"], "Next");
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_only_while_connected() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        let started = Instant::now();
        let ping = next_text(&mut rx).await;
        assert_eq!(ping["type"], "ping");
        assert!(started.elapsed() >= HEARTBEAT);

        let ping = next_text(&mut rx).await;
        assert_eq!(ping["type"], "ping");
        assert!(started.elapsed() >= HEARTBEAT * 2);

        events.on_close(ConnectionId(1));
        wait_state(&bridge, ConnectionState::Disconnected).await;

        // The engine drops its link on teardown, so the channel drains and closes.
        tokio::time::sleep(HEARTBEAT * 4).await;
        let mut pings_after_close = 0;
        while let Some(frame) = rx.recv().await {
            if let Outbound::Text(text) = frame {
                if text.contains("\"ping\"") {
                    pings_after_close += 1;
                }
            }
        }
        assert_eq!(pings_after_close, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rehandshake_refreshes_metadata() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        let call = bridge.send_command("get_context", json!({}));
        let plugin = async {
            let request = next_text(&mut rx).await;
            events.on_message(
                ConnectionId(1),
                json!({"type": "handshake", "payload": {"fileName": "Renamed"}}).to_string(),
            );
            let ack = next_text(&mut rx).await;
            assert_eq!(ack["type"], "handshake_ack");
            reply(&events, 1, &request["requestId"], json!({"page": "Home"}));
        };
        let (result, ()) = tokio::join!(call, plugin);

        assert_eq!(result.unwrap(), json!({"page": "Home"}));
        assert_eq!(bridge.document_info().unwrap()["fileName"], "Renamed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_closes_peer_and_fails_pending() {
        let (bridge, events) = bridge();
        let mut rx = connect(&bridge, &events, 1).await;

        let call = bridge.send_command("slow", json!({}));
        let stopper = async {
            next_text(&mut rx).await;
            wait_pending(&bridge, 1).await;
            bridge.stop().await;
        };
        let (result, ()) = tokio::join!(call, stopper);

        assert_eq!(result.unwrap_err().code(), "CONNECTION_CLOSED");
        assert_eq!(
            rx.recv().await,
            Some(Outbound::Close(CloseReason::ServerShutdown))
        );
        assert!(!bridge.is_connected());
        assert_eq!(
            bridge.send_command("ping", json!({})).await.unwrap_err().code(),
            "NOT_CONNECTED"
        );
    }
}
