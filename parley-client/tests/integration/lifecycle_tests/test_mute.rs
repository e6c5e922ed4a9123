use parley_core::ServerSignal;

use crate::integration::init_tracing;
use crate::utils::{MediaCall, TestSession};

#[tokio::test]
async fn test_mute_survives_capture_acquisition() {
    init_tracing();

    let mut alice = TestSession::in_created_room().await;
    alice.coordinator.set_muted(true);
    assert!(alice.media.calls().is_empty());

    alice
        .signal(ServerSignal::PeerJoined {
            display_name: "Bob".into(),
        })
        .await;

    let calls = alice.media.calls();
    let acquired = calls
        .iter()
        .position(|c| *c == MediaCall::AcquireAudio { id: 2 })
        .unwrap();
    assert_eq!(
        calls[acquired + 1],
        MediaCall::SetEnabled {
            audio: 2,
            enabled: false
        }
    );

    alice.media.clear_calls();
    alice.coordinator.set_muted(false);
    assert!(!alice.coordinator.is_muted());
    assert_eq!(
        alice.media.calls(),
        vec![MediaCall::SetEnabled {
            audio: 2,
            enabled: true
        }]
    );
}
