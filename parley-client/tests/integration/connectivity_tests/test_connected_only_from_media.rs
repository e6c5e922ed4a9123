use parley_client::media::{Connectivity, MediaEventKind};
use parley_client::{CallStatus, Role, SessionState};

use super::answered_call;
use crate::integration::init_tracing;

#[tokio::test]
async fn test_connected_requires_the_media_signal() {
    init_tracing();

    let mut bob = answered_call().await;
    assert_eq!(
        bob.coordinator.state(),
        SessionState::Negotiating(Role::Answerer)
    );
    assert_eq!(bob.status(), CallStatus::Connecting);

    bob.emit(MediaEventKind::Connectivity(Connectivity::Connecting))
        .await;
    assert_eq!(
        bob.coordinator.state(),
        SessionState::Negotiating(Role::Answerer)
    );

    bob.emit(MediaEventKind::RemoteTrack).await;
    assert!(bob.coordinator.has_remote_audio());
    assert_eq!(bob.status(), CallStatus::Connecting);

    bob.emit(MediaEventKind::Connectivity(Connectivity::Connected))
        .await;
    assert_eq!(bob.coordinator.state(), SessionState::Connected);
    assert_eq!(bob.status(), CallStatus::Connected);
}
