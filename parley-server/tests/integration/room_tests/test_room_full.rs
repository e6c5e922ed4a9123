use parley_core::{ErrorKind, ServerSignal};

use crate::integration::init_tracing;
use crate::utils::{TestRelay, join_room, paired_room};

#[tokio::test]
async fn test_third_join_is_rejected() {
    init_tracing();

    let mut relay = TestRelay::new(&["AB12CD"]);
    let (alice, bob, room_id) = paired_room(&mut relay).await;

    let carol = join_room(&mut relay, &room_id, "Carol").await;

    let signals = relay.output.signals_for(&carol).await;
    assert_eq!(signals.len(), 1);
    match &signals[0] {
        ServerSignal::Error { kind, .. } => assert_eq!(*kind, ErrorKind::RoomFull),
        other => panic!("expected room-full error, got {:?}", other),
    }

    // Existing members hear nothing.
    assert!(relay.output.signals_for(&alice).await.is_empty());
    assert!(relay.output.signals_for(&bob).await.is_empty());

    // Membership is unchanged: Carol cannot relay into the room.
    relay
        .send(
            carol,
            parley_core::ClientSignal::Offer {
                room_id: Some(room_id.clone()),
                sdp: "v=0".into(),
            },
        )
        .await;
    assert!(relay.output.signals_for(&alice).await.is_empty());
    assert!(relay.output.signals_for(&bob).await.is_empty());
}
