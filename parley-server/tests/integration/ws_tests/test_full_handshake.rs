use parley_core::{ClientSignal, IceCandidate, ServerSignal};

use crate::integration::init_tracing;
use crate::utils::{WsTestClient, spawn_server};

#[tokio::test]
async fn test_two_clients_complete_a_handshake() -> anyhow::Result<()> {
    init_tracing();

    let addr = spawn_server().await?;
    let mut alice = WsTestClient::connect(addr).await?;
    let mut bob = WsTestClient::connect(addr).await?;

    for client in [&mut alice, &mut bob] {
        assert!(matches!(client.recv().await?, ServerSignal::Welcome { .. }));
        match client.recv().await? {
            ServerSignal::IceConfig { ice_servers } => assert!(!ice_servers.is_empty()),
            other => panic!("expected ice-config, got {:?}", other),
        }
    }

    alice
        .send(&ClientSignal::CreateRoom {
            display_name: "Alice".into(),
        })
        .await?;
    let ServerSignal::RoomCreated { room_id } = alice.recv().await? else {
        panic!("expected room-created");
    };

    bob.send(&ClientSignal::JoinRoom {
        room_id: room_id.clone(),
        display_name: "Bob".into(),
    })
    .await?;
    assert_eq!(
        bob.recv().await?,
        ServerSignal::RoomJoined {
            room_id: room_id.clone(),
            peer_name: Some("Alice".into()),
        }
    );
    assert_eq!(
        alice.recv().await?,
        ServerSignal::PeerJoined {
            display_name: "Bob".into()
        }
    );

    alice
        .send(&ClientSignal::Offer {
            room_id: Some(room_id.clone()),
            sdp: "v=0 offer".into(),
        })
        .await?;
    assert_eq!(
        bob.recv().await?,
        ServerSignal::Offer {
            sdp: "v=0 offer".into()
        }
    );

    // Bob answers without naming the room.
    bob.send(&ClientSignal::Answer {
        room_id: None,
        sdp: "v=0 answer".into(),
    })
    .await?;
    bob.send(&ClientSignal::Candidate {
        room_id: None,
        candidate: IceCandidate::new("candidate:bob"),
    })
    .await?;
    assert_eq!(
        alice.recv().await?,
        ServerSignal::Answer {
            sdp: "v=0 answer".into()
        }
    );
    assert_eq!(
        alice.recv().await?,
        ServerSignal::Candidate {
            candidate: IceCandidate::new("candidate:bob")
        }
    );

    bob.close().await?;
    assert_eq!(
        alice.recv_until(|s| *s == ServerSignal::PeerLeft).await?,
        ServerSignal::PeerLeft
    );

    Ok(())
}
