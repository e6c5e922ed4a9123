use parley_core::{ErrorKind, RoomId};
use thiserror::Error;

/// Validation failures returned to the originating connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    #[error("Room {0} is full (2 participants maximum)")]
    RoomFull(RoomId),

    #[error("You are not a member of room {0}")]
    NotAMember(RoomId),

    #[error("You are not in a room")]
    NoRoom,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::RoomNotFound(_) => ErrorKind::RoomNotFound,
            RelayError::RoomFull(_) => ErrorKind::RoomFull,
            RelayError::NotAMember(_) | RelayError::NoRoom => ErrorKind::NotAMember,
        }
    }
}
