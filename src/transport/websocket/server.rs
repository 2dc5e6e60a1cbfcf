//! WebSocket push server
//!
//! Every connected dashboard gets an `initialData` frame and then every frame
//! published on the hub. Clients that fall behind skip frames: each update is
//! a full snapshot, so the next one supersedes whatever was missed.

use crate::error::Result;
use crate::monitoring::{Alert, Infrastructure};
use crate::state::AppState;
use crate::transport::websocket::events::PushEvent;
use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};
use tokio::sync::{broadcast, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Connection ID
pub type ConnectionId = Uuid;

/// Per-client bookkeeping
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: ConnectionId,
    pub client_addr: SocketAddr,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub messages_received: u64,
    pub messages_sent: u64,
}

impl ClientInfo {
    pub fn new(id: ConnectionId, client_addr: SocketAddr) -> Self {
        let now = Instant::now();
        Self {
            id,
            client_addr,
            connected_at: now,
            last_activity: now,
            messages_received: 0,
            messages_sent: 0,
        }
    }
}

/// Fan-out hub for push frames
#[derive(Debug, Clone)]
pub struct PushHub {
    sender: broadcast::Sender<Utf8Bytes>,
    connections: Arc<Mutex<HashMap<ConnectionId, ClientInfo>>>,
    total_connections: Arc<AtomicU64>,
    frames_published: Arc<AtomicU64>,
    /// One permit per allowed client, held for the life of the session
    slots: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl PushHub {
    pub fn new(buffer: usize, max_connections: usize, shutdown: CancellationToken) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self {
            sender,
            connections: Arc::new(Mutex::new(HashMap::new())),
            total_connections: Arc::new(AtomicU64::new(0)),
            frames_published: Arc::new(AtomicU64::new(0)),
            slots: Arc::new(Semaphore::new(max_connections.min(Semaphore::MAX_PERMITS))),
            shutdown,
        }
    }

    /// Encode once and send to every subscriber. Returns the number of
    /// subscribers reached; zero when nobody is connected.
    pub fn publish(&self, event: &PushEvent) -> Result<usize> {
        let frame = encode(event)?;
        self.frames_published.fetch_add(1, Ordering::Relaxed);
        let reached = self.sender.send(frame).unwrap_or(0);
        debug!(event = event.name(), reached, "published push frame");
        Ok(reached)
    }

    /// Publish `infrastructureUpdate` then `alertsUpdate`
    pub fn publish_snapshot(&self, infrastructure: Vec<Infrastructure>, alerts: Vec<Alert>) {
        for event in [
            PushEvent::InfrastructureUpdate(infrastructure),
            PushEvent::AlertsUpdate(alerts),
        ] {
            if let Err(e) = self.publish(&event) {
                warn!(event = event.name(), "failed to publish: {}", e);
            }
        }
    }

    /// Claim a client slot, or `None` when the hub is full
    pub fn reserve(&self) -> Option<OwnedSemaphorePermit> {
        self.slots.clone().try_acquire_owned().ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Utf8Bytes> {
        self.sender.subscribe()
    }

    pub async fn active_connections(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::SeqCst)
    }

    pub async fn statistics(&self) -> PushStatistics {
        PushStatistics {
            active_connections: self.active_connections().await,
            total_connections: self.total_connections(),
            frames_published: self.frames_published.load(Ordering::Relaxed),
        }
    }

    async fn register(&self, info: ClientInfo) {
        self.connections.lock().await.insert(info.id, info);
        self.total_connections.fetch_add(1, Ordering::SeqCst);
    }

    async fn unregister(&self, id: ConnectionId) -> Option<ClientInfo> {
        self.connections.lock().await.remove(&id)
    }

    async fn touch(&self, id: ConnectionId, received: u64, sent: u64) {
        if let Some(conn) = self.connections.lock().await.get_mut(&id) {
            conn.last_activity = Instant::now();
            conn.messages_received += received;
            conn.messages_sent += sent;
        }
    }
}

/// Push hub statistics
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PushStatistics {
    pub active_connections: usize,
    pub total_connections: u64,
    pub frames_published: u64,
}

fn encode(event: &PushEvent) -> Result<Utf8Bytes> {
    Ok(serde_json::to_string(event)?.into())
}

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    // Reserve before upgrading; the permit lives as long as the session
    let Some(slot) = state.push.reserve() else {
        warn!("Max connections reached, rejecting {}", addr);
        return (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, addr, slot))
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    addr: SocketAddr,
    slot: OwnedSemaphorePermit,
) {
    let conn_id = Uuid::new_v4();
    let hub = state.push.clone();

    // Subscribe before taking the snapshot so no tick falls in between.
    let mut updates = hub.subscribe();
    hub.register(ClientInfo::new(conn_id, addr)).await;
    info!(%conn_id, %addr, "New client connected");

    let (mut sender, mut receiver) = socket.split();

    let (infrastructure, alerts) = state.store.snapshot().await;
    let initial = PushEvent::InitialData {
        infrastructure,
        alerts,
    };
    let delivered = match encode(&initial) {
        Ok(frame) => sender.send(Message::Text(frame)).await.is_ok(),
        Err(e) => {
            warn!(%conn_id, "failed to encode initial data: {}", e);
            false
        }
    };

    if delivered {
        hub.touch(conn_id, 0, 1).await;
        loop {
            tokio::select! {
                _ = hub.shutdown.cancelled() => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                update = updates.recv() => match update {
                    Ok(frame) => {
                        if let Err(e) = sender.send(Message::Text(frame)).await {
                            debug!(%conn_id, "send failed: {}", e);
                            break;
                        }
                        hub.touch(conn_id, 0, 1).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%conn_id, skipped, "client lagging, skipped frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => hub.touch(conn_id, 1, 0).await,
                    Some(Err(e)) => {
                        debug!(%conn_id, "WebSocket error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    if let Some(info) = hub.unregister(conn_id).await {
        info!(
            %conn_id,
            addr = %info.client_addr,
            sent = info.messages_sent,
            received = info.messages_received,
            connected_for = ?info.connected_at.elapsed(),
            idle_for = ?info.last_activity.elapsed(),
            "Client disconnected"
        );
    }
    drop(slot);
}
