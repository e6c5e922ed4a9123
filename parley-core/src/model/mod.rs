mod participant;
mod room;
mod signaling;

pub use participant::{ConnectionId, Participant};
pub use room::RoomId;
pub use signaling::{ClientSignal, ErrorKind, IceCandidate, IceServerConfig, ServerSignal};
