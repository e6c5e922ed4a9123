mod signal_sink;
mod ws_gateway;

pub use signal_sink::*;
pub use ws_gateway::*;

use parley_core::ServerSignal;

/// What the gateway delivers to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Signal(ServerSignal),
    /// The signaling socket is gone; no further signals will arrive.
    Disconnected,
}
