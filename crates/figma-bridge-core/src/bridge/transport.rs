//! WebSocket endpoint the Figma plugin connects to.
//!
//! Exactly one peer is kept at a time: accepting a new socket closes the
//! previous one with reason `"New connection"`. Socket lifecycle is reported
//! through [`PeerEvents`]; every socket that ends raises exactly one
//! `on_close`, after `on_error` when the read side failed.
//!
//! # Port selection
//!
//! The preferred port is tried first, then each port above it up to the
//! scan range. Only "address in use" moves on to the next port; any other
//! bind error is returned immediately.

use crate::config::BridgeConfig;
use crate::{BridgeError, Result};
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Identity of one accepted socket. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Why the bridge closed a socket. Both use close code 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A newer plugin connection replaced this one.
    Superseded,
    /// The bridge is stopping.
    ServerShutdown,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Superseded => "New connection",
            CloseReason::ServerShutdown => "Server shutdown",
        }
    }
}

/// Instruction for a socket's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text(String),
    Close(CloseReason),
}

/// Sending half of one peer socket.
#[derive(Debug, Clone)]
pub struct PeerLink {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl PeerLink {
    /// Create a link and the receiver its writer drains.
    ///
    /// The endpoint pairs the receiver with a socket; tests can read it
    /// directly to observe what the engine sends.
    pub fn channel(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { id, outbound }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text frame. Returns false if the socket is already gone.
    pub fn send(&self, frame: String) -> bool {
        self.outbound.send(Outbound::Text(frame)).is_ok()
    }

    /// Ask the writer to send a close frame and stop.
    pub fn close(&self, reason: CloseReason) {
        let _ = self.outbound.send(Outbound::Close(reason));
    }
}

/// Lifecycle callbacks raised by the endpoint.
///
/// A single implementation is registered per endpoint. Callbacks must not
/// block; the engine implements them by posting into its mailbox.
pub trait PeerEvents: Send + Sync + 'static {
    fn on_connect(&self, link: PeerLink);
    fn on_message(&self, id: ConnectionId, text: String);
    fn on_close(&self, id: ConnectionId);
    fn on_error(&self, id: ConnectionId, message: String);
}

struct EndpointState {
    events: Arc<dyn PeerEvents>,
    next_id: AtomicU64,
    active: Mutex<Option<PeerLink>>,
}

impl EndpointState {
    fn active_slot(&self) -> MutexGuard<'_, Option<PeerLink>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a listening endpoint. Dropping closes it.
pub struct EndpointHandle {
    pub addr: SocketAddr,
    pub port: u16,
    state: Arc<EndpointState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl EndpointHandle {
    /// Best-effort send to the active peer.
    pub fn send(&self, frame: String) -> bool {
        let slot = self.state.active_slot();
        match slot.as_ref() {
            Some(link) => link.send(frame),
            None => {
                debug!("Dropping outbound frame: no plugin connected");
                false
            }
        }
    }

    /// Whether a peer socket is currently attached.
    pub fn has_peer(&self) -> bool {
        self.state.active_slot().is_some()
    }

    /// Close the active socket and stop listening. Idempotent.
    pub fn close(&mut self) {
        if let Some(link) = self.state.active_slot().take() {
            link.close(CloseReason::ServerShutdown);
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("WebSocket endpoint on port {} stopped", self.port);
        }
    }
}

impl Drop for EndpointHandle {
    fn drop(&mut self) {
        self.close();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// WebSocket server for the plugin connection.
pub struct SocketEndpoint;

impl SocketEndpoint {
    /// Bind the first free port in `preferred_port..=preferred_port+scan_range`
    /// and start accepting plugin sockets.
    pub async fn listen(
        host: &str,
        preferred_port: u16,
        scan_range: u16,
        events: Arc<dyn PeerEvents>,
    ) -> Result<EndpointHandle> {
        let listener = Self::bind_scan(host, preferred_port, scan_range).await?;
        let addr = listener.local_addr()?;
        let port = addr.port();

        info!("WebSocket server listening on {}", addr);

        let state = Arc::new(EndpointState {
            events,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
        });

        let app = Router::new()
            .route("/", get(upgrade))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task_handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                warn!("WebSocket server error: {}", e);
            }
        });

        Ok(EndpointHandle {
            addr,
            port,
            state,
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
        })
    }

    async fn bind_scan(host: &str, preferred_port: u16, scan_range: u16) -> Result<TcpListener> {
        let last = preferred_port.saturating_add(scan_range);

        for port in preferred_port..=last {
            match TcpListener::bind((host, port)).await {
                Ok(listener) => return Ok(listener),
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    if port < last {
                        warn!("Port {} in use, trying {}", port, port + 1);
                    } else {
                        warn!("Port {} in use", port);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(BridgeError::BindExhausted {
            first: preferred_port,
            last,
        })
    }
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<Arc<EndpointState>>) -> Response {
    ws.on_upgrade(move |socket| run_socket(socket, state))
}

async fn run_socket(socket: WebSocket, state: Arc<EndpointState>) {
    let id = ConnectionId(state.next_id.fetch_add(1, Ordering::Relaxed));
    let (link, mut outbound_rx) = PeerLink::channel(id);

    {
        let mut slot = state.active_slot();
        if let Some(previous) = slot.replace(link.clone()) {
            info!("Replacing existing plugin connection {}", previous.id());
            previous.close(CloseReason::Superseded);
        }
    }
    info!("Plugin connected ({})", id);
    state.events.on_connect(link);

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(outbound) = outbound_rx.recv().await {
            match outbound {
                Outbound::Text(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        debug!("Plugin socket write failed: {}", e);
                        break;
                    }
                }
                Outbound::Close(reason) => {
                    let frame = CloseFrame {
                        code: BridgeConfig::CLOSE_CODE_NORMAL,
                        reason: Cow::Borrowed(reason.as_str()),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => state.events.on_message(id, text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => state.events.on_message(id, text),
                    Err(_) => warn!("Dropping non UTF-8 binary frame from {}", id),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket error on {}: {}", id, e);
                    state.events.on_error(id, e.to_string());
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    writer.abort();

    {
        let mut slot = state.active_slot();
        if slot.as_ref().map(PeerLink::id) == Some(id) {
            *slot = None;
        }
    }
    info!("Plugin connection {} closed", id);
    state.events.on_close(id);
}
