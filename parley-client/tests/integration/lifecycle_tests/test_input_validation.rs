use parley_client::{CallStatus, SessionError, SessionState};
use parley_core::{ClientSignal, ErrorKind, ServerSignal};

use crate::integration::init_tracing;
use crate::utils::{TestSession, room};

#[tokio::test]
async fn test_bad_requests_never_reach_the_server() {
    init_tracing();

    let mut session = TestSession::new();

    let blank = session.coordinator.request_create_room("   ").await;
    assert!(matches!(blank, Err(SessionError::InvalidInput(_))));

    let bad_room = session.coordinator.request_join_room("a!", "Bob").await;
    assert!(matches!(bad_room, Err(SessionError::InvalidInput(_))));

    assert!(session.sink.sent().is_empty());
    assert_eq!(session.coordinator.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_room_ids_and_names_are_normalized() {
    init_tracing();

    let mut session = TestSession::new();
    session
        .coordinator
        .request_join_room(" ab12cd ", "  Bob ")
        .await
        .unwrap();

    assert_eq!(
        session.sink.sent(),
        vec![ClientSignal::JoinRoom {
            room_id: room(),
            display_name: "Bob".into()
        }]
    );
    assert_eq!(session.coordinator.display_name(), Some("Bob"));
}

#[tokio::test]
async fn test_one_room_at_a_time() {
    init_tracing();

    let mut alice = TestSession::in_created_room().await;
    let again = alice.coordinator.request_create_room("Alice").await;
    assert!(matches!(again, Err(SessionError::InvalidInput(_))));
}

#[tokio::test]
async fn test_server_rejection_is_shown() {
    init_tracing();

    let mut session = TestSession::new();
    session
        .coordinator
        .request_join_room("ZZZZZZ", "Bob")
        .await
        .unwrap();
    session
        .signal(ServerSignal::Error {
            message: "Room ZZZZZZ not found".into(),
            kind: ErrorKind::RoomNotFound,
        })
        .await;

    assert_eq!(
        session.status(),
        CallStatus::Error {
            message: "Room ZZZZZZ not found".into()
        }
    );
    assert_eq!(session.coordinator.state(), SessionState::Idle);
}
