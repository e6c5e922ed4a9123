use crate::room::RelayCommand;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use parley_core::{ConnectionId, IceServerConfig, ServerSignal};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Owns the outbound half of every client socket and the sender into the relay loop.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    pub(crate) relay_tx: mpsc::Sender<RelayCommand>,
}

impl SignalingService {
    pub fn new(relay_tx: mpsc::Sender<RelayCommand>, ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
            relay_tx,
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn add_connection(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(connection_id, tx);
    }

    pub fn remove_connection(&self, connection_id: &ConnectionId) {
        self.inner.connections.remove(connection_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Live room count as seen by the relay, `None` if the relay is gone.
    pub async fn room_count(&self) -> Option<usize> {
        let (reply, rx) = oneshot::channel();
        self.relay_tx
            .send(RelayCommand::RoomCount { reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub fn send_signal(&self, connection_id: ConnectionId, signal: &ServerSignal) {
        let Some(connection) = self.inner.connections.get(&connection_id) else {
            warn!(
                "Attempted to send signal to disconnected client {}",
                connection_id
            );
            return;
        };

        match serde_json::to_string(signal) {
            Ok(json) => {
                if let Err(e) = connection.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", connection_id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn send(&self, connection_id: ConnectionId, signal: ServerSignal) {
        self.send_signal(connection_id, &signal);
    }
}
