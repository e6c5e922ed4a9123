use parley_core::{ClientSignal, ConnectionId};
use tokio::sync::oneshot;

/// Commands fed to the relay loop by the WebSocket layer.
#[derive(Debug)]
pub enum RelayCommand {
    /// A parsed message from a client connection.
    Signal {
        connection_id: ConnectionId,
        signal: ClientSignal,
    },

    /// The transport closed, cleanly or not.
    Disconnect { connection_id: ConnectionId },

    /// Number of live rooms, for the health endpoint.
    RoomCount { reply: oneshot::Sender<usize> },
}
