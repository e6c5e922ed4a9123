use parley_client::media::{MediaEvent, MediaEventKind};
use parley_client::{CallStatus, ClientConfig, SessionCoordinator};
use parley_core::{IceCandidate, RoomId, ServerSignal};
use tokio::sync::mpsc;

use super::mock_media::MockMediaStack;
use super::recording_sink::RecordingSink;

pub const ROOM: &str = "AB12CD";

/// Test configuration: no codec rewriting so mock descriptions pass through.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        codec_preference: None,
        ..ClientConfig::default()
    }
}

pub fn room() -> RoomId {
    RoomId::parse(ROOM).expect("valid room id")
}

pub fn candidate(n: u32) -> IceCandidate {
    IceCandidate::new(format!("candidate:{}", n))
}

/// A coordinator wired to a scripted media stack and a recording sink. Media
/// events are only delivered when the test pumps them, which keeps ordering
/// deterministic.
pub struct TestSession {
    pub coordinator: SessionCoordinator<MockMediaStack, RecordingSink>,
    pub media: MockMediaStack,
    pub sink: RecordingSink,
    events: mpsc::UnboundedReceiver<MediaEvent>,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: parley_client::ClientConfig) -> Self {
        let media = MockMediaStack::new();
        let sink = RecordingSink::new();
        let (coordinator, events) = SessionCoordinator::new(media.clone(), sink.clone(), config);

        Self {
            coordinator,
            media,
            sink,
            events,
        }
    }

    /// Alice's side: room created, waiting for a peer.
    pub async fn in_created_room() -> Self {
        let mut session = Self::new();
        session
            .coordinator
            .request_create_room("Alice")
            .await
            .expect("create request accepted");
        session
            .signal(ServerSignal::RoomCreated { room_id: room() })
            .await;
        session
    }

    /// Bob's side: joined a room that already holds Alice.
    pub async fn in_joined_room() -> Self {
        let mut session = Self::new();
        session
            .coordinator
            .request_join_room(ROOM, "Bob")
            .await
            .expect("join request accepted");
        session
            .signal(ServerSignal::RoomJoined {
                room_id: room(),
                peer_name: Some("Alice".into()),
            })
            .await;
        session
    }

    pub async fn signal(&mut self, signal: ServerSignal) {
        self.coordinator.handle_signal(signal).await;
    }

    /// Delivers every media event emitted so far.
    pub async fn pump_media(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.coordinator.handle_media_event(event).await;
        }
    }

    pub async fn emit(&mut self, kind: MediaEventKind) {
        self.media.emit(kind);
        self.pump_media().await;
    }

    pub fn status(&self) -> CallStatus {
        self.coordinator.status()
    }
}
