use async_trait::async_trait;
use parley_core::{ConnectionId, ServerSignal};

/// Outbound side of the relay: whatever owns the client sockets implements this
/// so the relay can address a connection by id.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue a message for one connection. Per-connection order is preserved.
    async fn send(&self, connection_id: ConnectionId, signal: ServerSignal);
}
