use crate::error::SessionError;
use crate::session::SessionState;
use parley_core::RoomId;
use std::fmt;
use tracing::{info, warn};

/// User-facing call status, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallStatus {
    Idle,
    WaitingForPeer { room_id: RoomId },
    Connecting,
    Connected,
    /// Connectivity trouble while the media path may still recover.
    Unstable,
    /// The call cannot recover on its own; the user should restart it.
    Failed { reason: String },
    Ended { reason: String },
    Error { message: String },
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Idle => f.write_str("Idle"),
            CallStatus::WaitingForPeer { room_id } => {
                write!(f, "Waiting for a peer in room {}", room_id)
            }
            CallStatus::Connecting => f.write_str("Connecting"),
            CallStatus::Connected => f.write_str("Connected"),
            CallStatus::Unstable => f.write_str("Connection unstable"),
            CallStatus::Failed { reason } => write!(f, "Call failed: {}", reason),
            CallStatus::Ended { reason } => write!(f, "Call ended: {}", reason),
            CallStatus::Error { message } => write!(f, "Error: {}", message),
        }
    }
}

/// Diagnostics hook. Sees every transition without being able to steer them.
pub trait SessionObserver: Send + Sync {
    fn on_transition(&self, _from: SessionState, _to: SessionState) {}
    fn on_status(&self, _status: &CallStatus) {}
    fn on_error(&self, _error: &SessionError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_transition(&self, from: SessionState, to: SessionState) {
        info!("Session {} -> {}", from, to);
    }

    fn on_status(&self, status: &CallStatus) {
        info!("Status: {}", status);
    }

    fn on_error(&self, error: &SessionError) {
        warn!("Session error: {}", error);
    }
}
