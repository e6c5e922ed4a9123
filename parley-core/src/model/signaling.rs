use crate::model::participant::ConnectionId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

/// A trickled connectivity candidate, relayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_mid: Option<String>,
    #[serde(default, rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    RoomNotFound,
    RoomFull,
    NotAMember,
    InvalidMessage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::RoomNotFound => "room-not-found",
            ErrorKind::RoomFull => "room-full",
            ErrorKind::NotAMember => "not-a-member",
            ErrorKind::InvalidMessage => "invalid-message",
        };
        f.write_str(name)
    }
}

/// Messages a client sends to the signaling server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientSignal {
    CreateRoom {
        display_name: String,
    },
    JoinRoom {
        room_id: RoomId,
        display_name: String,
    },
    Offer {
        #[serde(default)]
        room_id: Option<RoomId>,
        sdp: String,
    },
    Answer {
        #[serde(default)]
        room_id: Option<RoomId>,
        sdp: String,
    },
    Candidate {
        #[serde(default)]
        room_id: Option<RoomId>,
        candidate: IceCandidate,
    },
    LeaveRoom {
        room_id: RoomId,
    },
}

/// Messages the signaling server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    Welcome {
        connection_id: ConnectionId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    RoomCreated {
        room_id: RoomId,
    },
    RoomJoined {
        room_id: RoomId,
        #[serde(default)]
        peer_name: Option<String>,
    },
    PeerJoined {
        display_name: String,
    },
    PeerLeft,
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    Candidate {
        candidate: IceCandidate,
    },
    Error {
        message: String,
        kind: ErrorKind,
    },
}
