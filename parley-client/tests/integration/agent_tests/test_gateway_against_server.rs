use std::time::Duration;

use parley_client::media::{MediaEventKind, SdpKind};
use parley_client::{CallCommand, CallStatus, ClientConfig, start_call};
use parley_server::{ServerConfig, serve_on};
use tokio::net::TcpListener;

use super::eventually;
use crate::integration::init_tracing;
use crate::utils::{MediaCall, MockMediaStack, candidate, test_config};

const LIMIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_two_agents_negotiate_through_real_server() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let config = ServerConfig::default();
        let _ = serve_on(listener, &config, std::future::pending()).await;
    });

    let config: ClientConfig = test_config().with_server_url(format!("ws://{}/ws", addr));
    let alice_media = MockMediaStack::new();
    let bob_media = MockMediaStack::new();

    let alice = start_call(config.clone(), alice_media.clone()).await.unwrap();
    let bob = start_call(config, bob_media.clone()).await.unwrap();

    alice.send(CallCommand::CreateRoom {
        display_name: "Alice".into(),
    });
    let mut alice_status = alice.status();
    let room_id = tokio::time::timeout(
        LIMIT,
        alice_status.wait_for(|s| matches!(s, CallStatus::WaitingForPeer { .. })),
    )
    .await
    .unwrap()
    .map(|s| match &*s {
        CallStatus::WaitingForPeer { room_id } => room_id.clone(),
        _ => unreachable!(),
    })
    .unwrap();

    bob.send(CallCommand::JoinRoom {
        room_id: room_id.to_string().to_lowercase(),
        display_name: "Bob".into(),
    });

    // Each side numbers its own mock objects: connection 1, audio 2.
    let answered = eventually(LIMIT, || {
        alice_media.calls().contains(&MediaCall::SetRemote {
            connection: 1,
            kind: SdpKind::Answer,
            sdp: "answer-1".into(),
        })
    })
    .await;
    assert!(answered, "alice never applied bob's answer");
    assert!(bob_media.calls().contains(&MediaCall::SetRemote {
        connection: 1,
        kind: SdpKind::Offer,
        sdp: "offer-1".into(),
    }));

    alice_media.emit(MediaEventKind::LocalCandidate(candidate(7)));
    let relayed = eventually(LIMIT, || {
        bob_media.applied_candidates(1) == vec!["candidate:7".to_string()]
    })
    .await;
    assert!(relayed, "candidate never reached bob");

    bob.send(CallCommand::Shutdown);
    let mut alice_status = alice.status();
    let waiting = tokio::time::timeout(
        LIMIT,
        alice_status.wait_for(|s| matches!(s, CallStatus::WaitingForPeer { .. })),
    )
    .await;
    assert!(waiting.is_ok(), "alice never saw bob leave");
    assert!(alice_media.calls().contains(&MediaCall::Close { connection: 1 }));

    alice.send(CallCommand::Shutdown);
}
