use crate::error::CaptureFailure;
use crate::media::{
    Connectivity, MediaConnection, MediaError, MediaEventKind, MediaEventSender, MediaStack,
    SdpKind, SilenceCapture,
};
use crate::session::PathEvidence;
use async_trait::async_trait;
use parley_core::{IceCandidate, IceServerConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Media stack backed by webrtc-rs, with a silence track as local capture.
#[derive(Debug, Default, Clone)]
pub struct RtcMediaStack;

impl RtcMediaStack {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaStack for RtcMediaStack {
    type Audio = SilenceCapture;
    type Connection = RtcMediaConnection;

    async fn create_connection(
        &self,
        ice_servers: &[IceServerConfig],
        events: MediaEventSender,
    ) -> Result<RtcMediaConnection, MediaError> {
        RtcMediaConnection::new(ice_servers, events).await
    }

    async fn acquire_audio(&self) -> Result<SilenceCapture, CaptureFailure> {
        Ok(SilenceCapture::start())
    }
}

#[derive(Default)]
struct InboundStats {
    live_tracks: AtomicUsize,
    packets_received: AtomicU64,
}

pub struct RtcMediaConnection {
    peer_connection: Arc<RTCPeerConnection>,
    inbound: Arc<InboundStats>,
}

impl RtcMediaConnection {
    pub async fn new(
        ice_servers: &[IceServerConfig],
        events: MediaEventSender,
    ) -> Result<Self, MediaError> {
        let create_err = |e: webrtc::Error| MediaError::Create(e.to_string());

        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs().map_err(create_err)?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(create_err)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(create_err)?,
        );
        let inbound = Arc::new(InboundStats::default());
        let generation = events.generation();

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                info!("Media connection #{} state: {}", generation, s);
                if let Some(connectivity) = map_state(s) {
                    state_events.send(MediaEventKind::Connectivity(connectivity));
                }
                Box::pin(async {})
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    debug!("Local candidate gathering complete");
                    return;
                };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.send(MediaEventKind::LocalCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                }));
            })
        }));

        let track_events = events;
        let track_stats = inbound.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                let stats = track_stats.clone();

                Box::pin(async move {
                    info!(
                        "Remote track arrived: {} ({})",
                        track.id(),
                        track.codec().capability.mime_type
                    );
                    stats.live_tracks.fetch_add(1, Ordering::SeqCst);
                    events.send(MediaEventKind::RemoteTrack);

                    tokio::spawn(async move {
                        while track.read_rtp().await.is_ok() {
                            stats.packets_received.fetch_add(1, Ordering::Relaxed);
                        }
                        stats.live_tracks.fetch_sub(1, Ordering::SeqCst);
                        debug!("Remote track {} ended", track.id());
                    });
                })
            },
        ));

        Ok(Self {
            peer_connection,
            inbound,
        })
    }

    fn description(kind: SdpKind, sdp: String) -> Result<RTCSessionDescription, MediaError> {
        match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp),
            SdpKind::Answer => RTCSessionDescription::answer(sdp),
        }
        .map_err(|e| MediaError::Description(e.to_string()))
    }
}

#[async_trait]
impl MediaConnection for RtcMediaConnection {
    type Audio = SilenceCapture;

    async fn attach_audio(&self, audio: &SilenceCapture) -> Result<(), MediaError> {
        let rtp_sender = self
            .peer_connection
            .add_track(audio.track() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| MediaError::Track(e.to_string()))?;

        // RTCP has to be drained for the interceptors to keep working.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtp_sender.read(&mut buf).await.is_ok() {}
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<String, MediaError> {
        self.peer_connection
            .create_offer(None)
            .await
            .map(|offer| offer.sdp)
            .map_err(|e| MediaError::Description(e.to_string()))
    }

    async fn create_answer(&self) -> Result<String, MediaError> {
        self.peer_connection
            .create_answer(None)
            .await
            .map(|answer| answer.sdp)
            .map_err(|e| MediaError::Description(e.to_string()))
    }

    async fn set_local_description(&self, kind: SdpKind, sdp: String) -> Result<(), MediaError> {
        let desc = Self::description(kind, sdp)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(|e| MediaError::Description(e.to_string()))
    }

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<(), MediaError> {
        let desc = Self::description(kind, sdp)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| MediaError::Description(e.to_string()))
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| MediaError::Candidate(e.to_string()))
    }

    fn evidence(&self) -> PathEvidence {
        PathEvidence {
            live_remote_tracks: self.inbound.live_tracks.load(Ordering::SeqCst),
            muted_remote_tracks: 0,
            packets_received: self.inbound.packets_received.load(Ordering::Relaxed),
        }
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Error while closing media connection: {}", e);
        }
    }
}

fn map_state(state: RTCPeerConnectionState) -> Option<Connectivity> {
    match state {
        RTCPeerConnectionState::New => Some(Connectivity::New),
        RTCPeerConnectionState::Connecting => Some(Connectivity::Connecting),
        RTCPeerConnectionState::Connected => Some(Connectivity::Connected),
        RTCPeerConnectionState::Disconnected => Some(Connectivity::Disconnected),
        RTCPeerConnectionState::Failed => Some(Connectivity::Failed),
        RTCPeerConnectionState::Closed => Some(Connectivity::Closed),
        _ => None,
    }
}
