use parley_client::{CallStatus, ClientConfig};
use parley_core::ServerSignal;
use tokio::time::{Duration, Instant};

use crate::integration::init_tracing;
use crate::utils::{ROOM, TestSession, room, test_config};

async fn offer_without_answer(config: ClientConfig) -> TestSession {
    let mut alice = TestSession::with_config(config);
    alice
        .coordinator
        .request_create_room("Alice")
        .await
        .unwrap();
    alice
        .signal(ServerSignal::RoomCreated { room_id: room() })
        .await;
    alice
        .signal(ServerSignal::PeerJoined {
            display_name: "Bob".into(),
        })
        .await;
    alice
}

#[tokio::test]
async fn test_stalled_negotiation_waits_by_default() {
    init_tracing();

    let mut alice = offer_without_answer(test_config()).await;
    alice
        .coordinator
        .health_check(Instant::now() + Duration::from_secs(3600));

    assert_eq!(alice.status(), CallStatus::Connecting);
    assert_eq!(alice.coordinator.room_id().map(|r| r.as_str()), Some(ROOM));
}

#[tokio::test]
async fn test_configured_timeout_surfaces_failure() {
    init_tracing();

    let timeout = Duration::from_secs(10);
    let mut alice = offer_without_answer(ClientConfig {
        negotiation_timeout: Some(timeout),
        ..test_config()
    })
    .await;

    let start = Instant::now();
    alice.coordinator.health_check(start + Duration::from_secs(5));
    assert_eq!(alice.status(), CallStatus::Connecting);

    alice
        .coordinator
        .health_check(start + timeout + Duration::from_secs(1));
    assert!(matches!(alice.status(), CallStatus::Failed { .. }));
}
