//! Seams to the peer-to-peer media stack.
//!
//! The session logic only talks to these traits. `rtc_connection` and
//! `silence_capture` implement them on top of webrtc-rs; tests plug in a
//! scripted stack.

mod rtc_connection;
mod silence_capture;

pub use rtc_connection::*;
pub use silence_capture::*;

use crate::error::CaptureFailure;
use crate::session::PathEvidence;
use async_trait::async_trait;
use parley_core::{IceCandidate, IceServerConfig};
use tokio::sync::mpsc;

/// Identifies which media connection produced an event. Bumped every time a
/// connection is closed or rebuilt so late callbacks can be told apart.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Connectivity as reported by the media connection itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// A local candidate to trickle to the peer.
    LocalCandidate(IceCandidate),
    Connectivity(Connectivity),
    /// The peer's audio track arrived.
    RemoteTrack,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: Generation,
    pub kind: MediaEventKind,
}

/// Handed to a media connection at creation; stamps every event with the
/// connection's generation.
#[derive(Debug, Clone)]
pub struct MediaEventSender {
    generation: Generation,
    tx: mpsc::UnboundedSender<MediaEvent>,
}

impl MediaEventSender {
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns `false` once the session side has gone away.
    pub fn send(&self, kind: MediaEventKind) -> bool {
        self.tx
            .send(MediaEvent {
                generation: self.generation,
                kind,
            })
            .is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("failed to create media connection: {0}")]
    Create(String),
    #[error("failed to attach local audio: {0}")]
    Track(String),
    #[error("session description rejected: {0}")]
    Description(String),
    #[error("candidate rejected: {0}")]
    Candidate(String),
    #[error("media connection is closed")]
    Closed,
}

/// A live local capture. Owned by exactly one session at a time.
pub trait AudioSource: Send + Sync {
    fn set_enabled(&self, enabled: bool);
    /// Releases the device. Calling it twice is harmless.
    fn stop(&self);
}

#[async_trait]
pub trait MediaConnection: Send + Sync {
    type Audio: AudioSource;

    async fn attach_audio(&self, audio: &Self::Audio) -> Result<(), MediaError>;
    async fn create_offer(&self) -> Result<String, MediaError>;
    async fn create_answer(&self) -> Result<String, MediaError>;
    async fn set_local_description(&self, kind: SdpKind, sdp: String) -> Result<(), MediaError>;
    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<(), MediaError>;
    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError>;
    /// What the connection can currently prove about the inbound media path.
    fn evidence(&self) -> PathEvidence;
    async fn close(&self);
}

#[async_trait]
pub trait MediaStack: Send + Sync {
    type Audio: AudioSource + 'static;
    type Connection: MediaConnection<Audio = Self::Audio> + 'static;

    async fn create_connection(
        &self,
        ice_servers: &[IceServerConfig],
        events: MediaEventSender,
    ) -> Result<Self::Connection, MediaError>;

    async fn acquire_audio(&self) -> Result<Self::Audio, CaptureFailure>;
}
