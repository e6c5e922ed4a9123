use parley_client::media::{Connectivity, MediaEventKind};
use parley_client::{CallStatus, SessionState};
use parley_core::{ClientSignal, ServerSignal};

use crate::integration::init_tracing;
use crate::utils::{MediaCall, TestSession, room};

#[tokio::test]
async fn test_second_hangup_is_a_no_op() {
    init_tracing();

    let mut bob = TestSession::in_joined_room().await;
    bob.signal(ServerSignal::Offer {
        sdp: "offer-from-alice".into(),
    })
    .await;
    bob.emit(MediaEventKind::Connectivity(Connectivity::Connected))
        .await;
    bob.sink.clear();
    bob.media.clear_calls();

    bob.coordinator.hangup().await;
    bob.coordinator.hangup().await;

    assert_eq!(
        bob.sink.sent(),
        vec![ClientSignal::LeaveRoom { room_id: room() }]
    );
    assert_eq!(
        bob.media.calls(),
        vec![
            MediaCall::Close { connection: 1 },
            MediaCall::StopAudio { audio: 2 },
        ]
    );
    assert_eq!(bob.coordinator.state(), SessionState::Closed);
    assert_eq!(
        bob.status(),
        CallStatus::Ended {
            reason: "You hung up".into()
        }
    );
}

#[tokio::test]
async fn test_hangup_before_media_exists() {
    init_tracing();

    let mut alice = TestSession::in_created_room().await;
    alice.sink.clear();

    alice.coordinator.hangup().await;

    assert_eq!(alice.sink.leave_count(), 1);
    assert!(alice.media.calls().is_empty());
    assert_eq!(alice.coordinator.state(), SessionState::Closed);

    let mut idle = TestSession::new();
    idle.coordinator.hangup().await;
    assert!(idle.sink.sent().is_empty());
    assert_eq!(idle.coordinator.state(), SessionState::Idle);
}
