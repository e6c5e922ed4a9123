use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

/// Protocol state of one call. `Closed` is re-entered on every teardown and
/// left again when the room is still held (peer left) or a new room is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingPeer,
    Negotiating(Role),
    Connected,
    Closed,
}

impl SessionState {
    pub fn is_negotiating(&self) -> bool {
        matches!(self, SessionState::Negotiating(_))
    }

    /// States in which a media connection is expected to exist.
    pub fn has_media(&self) -> bool {
        matches!(self, SessionState::Negotiating(_) | SessionState::Connected)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Offerer => f.write_str("offerer"),
            Role::Answerer => f.write_str("answerer"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::AwaitingPeer => f.write_str("awaiting-peer"),
            SessionState::Negotiating(role) => write!(f, "negotiating({})", role),
            SessionState::Connected => f.write_str("connected"),
            SessionState::Closed => f.write_str("closed"),
        }
    }
}
