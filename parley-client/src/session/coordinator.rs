use crate::config::ClientConfig;
use crate::error::{CaptureFailure, SessionError};
use crate::media::{
    AudioSource, Connectivity, Generation, MediaConnection, MediaEvent, MediaEventKind,
    MediaEventSender, MediaStack, SdpKind,
};
use crate::session::{
    CallStatus, CandidateDisposition, NegotiationSession, Role, SessionObserver, SessionState,
    TracingObserver, ViabilityProbe,
};
use crate::transport::SignalSink;
use parley_core::{
    ClientSignal, ConnectionId, ErrorKind, IceCandidate, IceServerConfig, RoomId, ServerSignal,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Client side of one call.
///
/// Drives the media connection through the offer/answer exchange and owns the
/// local capture. Every input (server signal, media event, user request, health
/// tick) is handled to completion before the next one, so the coordinator itself
/// needs no locking.
pub struct SessionCoordinator<M: MediaStack, S: SignalSink> {
    media: M,
    signals: S,
    config: ClientConfig,
    ice_servers: Vec<IceServerConfig>,
    observer: Arc<dyn SessionObserver>,

    state: SessionState,
    connection_id: Option<ConnectionId>,
    room_id: Option<RoomId>,
    display_name: Option<String>,
    peer_name: Option<String>,
    /// A create or join request is waiting for the server's reply.
    room_request_pending: bool,
    /// Room replies still to come for requests the user hung up on.
    abandoned_replies: usize,

    negotiation: NegotiationSession,
    connection: Option<M::Connection>,
    audio: Option<M::Audio>,
    generation: Generation,
    media_tx: mpsc::UnboundedSender<MediaEvent>,

    probe: ViabilityProbe,
    trouble_since: Option<Instant>,
    negotiating_since: Option<Instant>,
    remote_audio: bool,
    muted: bool,

    status_tx: watch::Sender<CallStatus>,
}

impl<M: MediaStack, S: SignalSink> SessionCoordinator<M, S> {
    /// Returns the coordinator and the receiver its media connections report to.
    pub fn new(
        media: M,
        signals: S,
        config: ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<MediaEvent>) {
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(CallStatus::Idle);

        let coordinator = Self {
            media,
            signals,
            ice_servers: config.ice_servers.clone(),
            config,
            observer: Arc::new(TracingObserver),
            state: SessionState::Idle,
            connection_id: None,
            room_id: None,
            display_name: None,
            peer_name: None,
            room_request_pending: false,
            abandoned_replies: 0,
            negotiation: NegotiationSession::new(),
            connection: None,
            audio: None,
            generation: 0,
            media_tx,
            probe: ViabilityProbe::new(),
            trouble_since: None,
            negotiating_since: None,
            remote_audio: false,
            muted: false,
            status_tx,
        };
        (coordinator, media_rx)
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> CallStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallStatus> {
        self.status_tx.subscribe()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn negotiation(&self) -> &NegotiationSession {
        &self.negotiation
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn has_remote_audio(&self) -> bool {
        self.remote_audio
    }

    pub fn ice_servers(&self) -> &[IceServerConfig] {
        &self.ice_servers
    }

    pub async fn request_create_room(&mut self, display_name: &str) -> Result<(), SessionError> {
        let display_name = validate_name(display_name)?;
        self.ensure_free()?;

        self.prepare_for_room(display_name.clone());
        self.signals
            .send(ClientSignal::CreateRoom { display_name })
            .await?;
        self.room_request_pending = true;
        Ok(())
    }

    pub async fn request_join_room(
        &mut self,
        room_id: &str,
        display_name: &str,
    ) -> Result<(), SessionError> {
        let display_name = validate_name(display_name)?;
        let room_id = RoomId::parse(room_id).ok_or_else(|| {
            SessionError::InvalidInput(format!("'{}' is not a valid room id", room_id.trim()))
        })?;
        self.ensure_free()?;

        self.prepare_for_room(display_name.clone());
        self.signals
            .send(ClientSignal::JoinRoom {
                room_id,
                display_name,
            })
            .await?;
        self.room_request_pending = true;
        Ok(())
    }

    /// Toggles the local capture without renegotiating. Remembered across
    /// reacquisition.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(audio) = &self.audio {
            audio.set_enabled(!muted);
        }
        info!("Microphone {}", if muted { "muted" } else { "live" });
    }

    /// Surfaces a rejected user request on the status indicator.
    pub fn report(&self, error: SessionError) {
        self.observer.on_error(&error);
        self.publish(CallStatus::Error {
            message: error.to_string(),
        });
    }

    /// Leaves the room and releases everything. Safe to call repeatedly.
    pub async fn hangup(&mut self) {
        let Some(room_id) = self.room_id.take() else {
            if self.room_request_pending {
                info!("Hung up before the server confirmed the room");
                self.room_request_pending = false;
                self.abandoned_replies += 1;
                self.end_by_user().await;
            } else if self.state != SessionState::Closed && self.state != SessionState::Idle {
                self.teardown().await;
                self.transition(SessionState::Closed);
            }
            return;
        };

        if let Err(e) = self.signals.send(ClientSignal::LeaveRoom { room_id }).await {
            warn!("Could not announce leave: {}", e);
        }

        self.end_by_user().await;
    }

    async fn end_by_user(&mut self) {
        self.teardown().await;
        self.peer_name = None;
        self.transition(SessionState::Closed);
        self.publish(CallStatus::Ended {
            reason: "You hung up".to_string(),
        });
    }

    /// The signaling channel dropped. Without it nothing can be negotiated
    /// or announced, so the call ends here.
    pub async fn transport_lost(&mut self) {
        self.teardown().await;
        self.room_id = None;
        self.peer_name = None;
        self.room_request_pending = false;
        self.abandoned_replies = 0;
        self.transition(SessionState::Closed);
        self.publish(CallStatus::Error {
            message: "Lost connection to the signaling server".to_string(),
        });
    }

    pub async fn handle_signal(&mut self, signal: ServerSignal) {
        if let Err(e) = self.dispatch_signal(signal).await {
            self.fail(e).await;
        }
    }

    async fn dispatch_signal(&mut self, signal: ServerSignal) -> Result<(), SessionError> {
        match signal {
            ServerSignal::Welcome { connection_id } => {
                debug!("Signaling server assigned id {}", connection_id);
                self.connection_id = Some(connection_id);
            }

            ServerSignal::IceConfig { ice_servers } => {
                if ice_servers.is_empty() {
                    debug!("Server sent an empty ICE list, keeping the configured one");
                } else {
                    info!("Using {} ICE server entries from the server", ice_servers.len());
                    self.ice_servers = ice_servers;
                }
            }

            ServerSignal::RoomCreated { room_id } => {
                if self.take_abandoned_reply() {
                    self.leave_abandoned(room_id).await;
                    return Ok(());
                }
                info!("Room {} created", room_id);
                self.enter_room(room_id.clone());
                self.publish(CallStatus::WaitingForPeer { room_id });
            }

            ServerSignal::RoomJoined { room_id, peer_name } => {
                if self.take_abandoned_reply() {
                    self.leave_abandoned(room_id).await;
                    return Ok(());
                }
                info!("Joined room {}", room_id);
                self.enter_room(room_id.clone());
                match peer_name {
                    Some(name) => {
                        self.peer_name = Some(name);
                        self.publish(CallStatus::Connecting);
                    }
                    None => self.publish(CallStatus::WaitingForPeer { room_id }),
                }
            }

            ServerSignal::PeerJoined { display_name } => {
                info!("{} joined the room", display_name);
                self.peer_name = Some(display_name);
                if self.state == SessionState::AwaitingPeer {
                    self.start_offer().await?;
                } else {
                    warn!("Ignoring peer-joined while {}", self.state);
                }
            }

            ServerSignal::Offer { sdp } => self.handle_remote_offer(sdp).await?,

            ServerSignal::Answer { sdp } => self.handle_remote_answer(sdp).await?,

            ServerSignal::Candidate { candidate } => self.handle_remote_candidate(candidate).await,

            ServerSignal::PeerLeft => self.handle_peer_left().await,

            ServerSignal::Error { message, kind } => {
                let answers_room_request =
                    matches!(kind, ErrorKind::RoomNotFound | ErrorKind::RoomFull);
                if answers_room_request && self.take_abandoned_reply() {
                    debug!("Join rejected after hangup ({}), nothing to leave", kind);
                    return Ok(());
                }
                if answers_room_request {
                    self.room_request_pending = false;
                }
                warn!("Server rejected a request ({}): {}", kind, message);
                self.publish(CallStatus::Error { message });
            }
        }
        Ok(())
    }

    /// Offerer path. Tracks are attached before the offer is generated so it
    /// advertises send capability.
    async fn start_offer(&mut self) -> Result<(), SessionError> {
        self.publish(CallStatus::Connecting);

        self.rebuild_connection().await?;
        self.acquire_audio().await?;
        self.attach_audio().await?;

        self.negotiation.begin(Role::Offerer);
        self.transition(SessionState::Negotiating(Role::Offerer));

        let connection = self.connection()?;
        let offer = connection.create_offer().await?;
        connection
            .set_local_description(SdpKind::Offer, offer.clone())
            .await?;

        info!("Sending offer");
        self.signals
            .send(ClientSignal::Offer {
                room_id: self.room_id.clone(),
                sdp: self.filter_description(offer),
            })
            .await
    }

    /// Answerer path.
    async fn handle_remote_offer(&mut self, sdp: String) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::AwaitingPeer => {}
            SessionState::Negotiating(_) | SessionState::Connected => {
                warn!("Offer received while {}, renegotiating on a fresh connection", self.state);
                self.close_connection().await;
            }
            SessionState::Closed => {
                debug!("Offer received after the call closed, ignoring");
                return Ok(());
            }
        }

        self.publish(CallStatus::Connecting);

        let created = self.ensure_connection().await?;
        let acquired = if self.audio.is_none() {
            self.acquire_audio().await?;
            true
        } else {
            false
        };
        if created || acquired {
            self.attach_audio().await?;
        }

        self.negotiation.begin(Role::Answerer);
        self.transition(SessionState::Negotiating(Role::Answerer));

        self.connection()?
            .set_remote_description(SdpKind::Offer, sdp)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))?;
        self.flush_candidates().await;

        let connection = self.connection()?;
        let answer = connection.create_answer().await?;
        connection
            .set_local_description(SdpKind::Answer, answer.clone())
            .await?;

        info!("Sending answer");
        self.signals
            .send(ClientSignal::Answer {
                room_id: self.room_id.clone(),
                sdp: self.filter_description(answer),
            })
            .await
    }

    async fn handle_remote_answer(&mut self, sdp: String) -> Result<(), SessionError> {
        if self.state != SessionState::Negotiating(Role::Offerer) || self.negotiation.remote_applied()
        {
            warn!("Unexpected answer while {}, ignoring", self.state);
            return Ok(());
        }

        self.connection()?
            .set_remote_description(SdpKind::Answer, sdp)
            .await
            .map_err(|e| SessionError::Negotiation(e.to_string()))?;
        info!("Remote answer applied");
        self.flush_candidates().await;
        Ok(())
    }

    async fn handle_remote_candidate(&mut self, candidate: IceCandidate) {
        if matches!(self.state, SessionState::Closed) {
            debug!("Candidate received after close, dropping");
            return;
        }

        match self.negotiation.accept_candidate(candidate) {
            CandidateDisposition::Apply(candidate) => self.apply_candidate(candidate).await,
            CandidateDisposition::Queued { pending } => {
                debug!("Remote description not applied yet, {} candidate(s) queued", pending);
            }
        }
    }

    async fn flush_candidates(&mut self) {
        let queued = self.negotiation.mark_remote_applied();
        if !queued.is_empty() {
            debug!("Applying {} queued candidate(s)", queued.len());
        }
        for candidate in queued {
            self.apply_candidate(candidate).await;
        }
    }

    /// Best effort: a lost candidate is tolerable if others converge.
    async fn apply_candidate(&self, candidate: IceCandidate) {
        let Some(connection) = &self.connection else {
            warn!("No media connection for candidate {}", candidate.candidate);
            return;
        };
        if let Err(e) = connection.add_candidate(candidate).await {
            let error = SessionError::CandidateApply(e.to_string());
            warn!("{}", error);
            self.observer.on_error(&error);
        }
    }

    async fn handle_peer_left(&mut self) {
        info!("Peer left the call");
        self.teardown().await;
        self.peer_name = None;
        self.transition(SessionState::Closed);

        match self.room_id.clone() {
            Some(room_id) => {
                self.transition(SessionState::AwaitingPeer);
                self.publish(CallStatus::WaitingForPeer { room_id });
            }
            None => self.publish(CallStatus::Ended {
                reason: "The other participant left".to_string(),
            }),
        }
    }

    pub async fn handle_media_event(&mut self, event: MediaEvent) {
        if event.generation != self.generation || self.connection.is_none() {
            debug!(
                "Dropping event from media connection #{} (current #{})",
                event.generation, self.generation
            );
            return;
        }

        match event.kind {
            MediaEventKind::LocalCandidate(candidate) => {
                let Some(room_id) = self.room_id.clone() else {
                    return;
                };
                let signal = ClientSignal::Candidate {
                    room_id: Some(room_id),
                    candidate,
                };
                if let Err(e) = self.signals.send(signal).await {
                    warn!("Local candidate not sent: {}", e);
                }
            }

            MediaEventKind::RemoteTrack => {
                info!("Receiving remote audio");
                self.remote_audio = true;
            }

            MediaEventKind::Connectivity(connectivity) => {
                self.handle_connectivity(connectivity)
            }
        }
    }

    fn handle_connectivity(&mut self, connectivity: Connectivity) {
        if !self.state.has_media() {
            return;
        }

        match connectivity {
            Connectivity::Connected => {
                self.trouble_since = None;
                self.negotiating_since = None;
                self.probe.reset();
                if self.state != SessionState::Connected {
                    self.transition(SessionState::Connected);
                }
                self.publish(CallStatus::Connected);
            }

            Connectivity::Disconnected => {
                debug!("Media path reports trouble, watching for recovery");
                self.mark_trouble();
                self.publish(CallStatus::Unstable);
            }

            Connectivity::Failed => {
                if self.assess_viability() {
                    info!("Media path reported failure but audio is still flowing");
                    self.mark_trouble();
                    self.publish(CallStatus::Unstable);
                } else {
                    self.surface_loss();
                }
            }

            Connectivity::New | Connectivity::Connecting | Connectivity::Closed => {}
        }
    }

    /// Periodic check driving the loss grace period and the optional
    /// negotiation timeout.
    pub fn health_check(&mut self, now: Instant) {
        if let Some(since) = self.trouble_since
            && now.duration_since(since) >= self.config.loss_grace
        {
            if self.assess_viability() {
                debug!("Troubled path still carries audio, extending grace");
                self.trouble_since = Some(now);
            } else {
                self.surface_loss();
            }
        }

        if let (Some(timeout), Some(since)) = (self.config.negotiation_timeout, self.negotiating_since)
            && self.state.is_negotiating()
            && now.duration_since(since) >= timeout
        {
            self.negotiating_since = None;
            if self.assess_viability() {
                debug!("Negotiation slow but media is flowing");
                return;
            }
            let error = SessionError::Negotiation("timed out waiting for the peer".to_string());
            self.observer.on_error(&error);
            self.publish(CallStatus::Failed {
                reason: error.to_string(),
            });
        }
    }

    fn mark_trouble(&mut self) {
        if self.trouble_since.is_none() {
            self.trouble_since = Some(Instant::now());
            // Baseline for the packet comparison once the grace period ends.
            self.assess_viability();
        }
    }

    fn assess_viability(&mut self) -> bool {
        let Some(connection) = &self.connection else {
            return false;
        };
        let mut evidence = connection.evidence();
        // The track event may beat the connection's own bookkeeping.
        if self.remote_audio && evidence.live_remote_tracks == 0 {
            evidence.live_remote_tracks = 1;
        }
        self.probe.assess(evidence)
    }

    fn surface_loss(&mut self) {
        self.trouble_since = None;
        let error = SessionError::Negotiation("media path lost".to_string());
        self.observer.on_error(&error);
        self.publish(CallStatus::Failed {
            reason: "Connection lost. Hang up and start the call again.".to_string(),
        });
    }

    fn connection(&self) -> Result<&M::Connection, SessionError> {
        self.connection
            .as_ref()
            .ok_or(SessionError::Media(crate::media::MediaError::Closed))
    }

    async fn ensure_connection(&mut self) -> Result<bool, SessionError> {
        if self.connection.is_some() {
            return Ok(false);
        }
        self.rebuild_connection().await?;
        Ok(true)
    }

    /// Closes any existing connection before a new one is created.
    async fn rebuild_connection(&mut self) -> Result<(), SessionError> {
        self.close_connection().await;

        self.generation += 1;
        let events = MediaEventSender::new(self.generation, self.media_tx.clone());
        let connection = self
            .media
            .create_connection(&self.ice_servers, events)
            .await?;
        debug!("Media connection #{} created", self.generation);

        self.connection = Some(connection);
        self.negotiating_since = Some(Instant::now());
        Ok(())
    }

    /// Releases any prior capture first: one capture per session at a time.
    async fn acquire_audio(&mut self) -> Result<(), SessionError> {
        self.release_audio();

        let audio = self.media.acquire_audio().await?;
        if self.muted {
            audio.set_enabled(false);
        }
        self.audio = Some(audio);
        Ok(())
    }

    async fn attach_audio(&self) -> Result<(), SessionError> {
        let (Some(connection), Some(audio)) = (&self.connection, &self.audio) else {
            return Err(SessionError::Media(crate::media::MediaError::Closed));
        };
        connection.attach_audio(audio).await?;
        Ok(())
    }

    async fn close_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
            debug!("Media connection #{} closed", self.generation);
            self.generation += 1;
        }
        self.probe.reset();
        self.trouble_since = None;
        self.negotiating_since = None;
        self.remote_audio = false;
    }

    fn release_audio(&mut self) {
        if let Some(audio) = self.audio.take() {
            audio.stop();
        }
    }

    async fn teardown(&mut self) {
        self.close_connection().await;
        self.release_audio();
        self.negotiation.reset();
    }

    /// The next room reply belongs to a request the user already hung up on.
    fn take_abandoned_reply(&mut self) -> bool {
        if self.abandoned_replies == 0 {
            return false;
        }
        self.abandoned_replies -= 1;
        true
    }

    async fn leave_abandoned(&mut self, room_id: RoomId) {
        info!("Leaving room {} confirmed after hangup", room_id);
        if let Err(e) = self.signals.send(ClientSignal::LeaveRoom { room_id }).await {
            warn!("Could not announce leave: {}", e);
        }
    }

    fn ensure_free(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Closed
                if self.room_id.is_none() && !self.room_request_pending =>
            {
                Ok(())
            }
            _ => Err(SessionError::InvalidInput(
                "already in a room; hang up first".to_string(),
            )),
        }
    }

    fn prepare_for_room(&mut self, display_name: String) {
        self.display_name = Some(display_name);
        if self.state == SessionState::Closed {
            self.transition(SessionState::Idle);
        }
    }

    fn enter_room(&mut self, room_id: RoomId) {
        self.room_request_pending = false;
        self.room_id = Some(room_id);
        if matches!(self.state, SessionState::Idle | SessionState::Closed) {
            self.transition(SessionState::AwaitingPeer);
        }
    }

    /// Applied to the copy sent to the peer only. The media connection must keep
    /// the description it generated.
    fn filter_description(&self, sdp: String) -> String {
        match &self.config.codec_preference {
            Some(preference) => preference.apply(&sdp),
            None => sdp,
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        let from = std::mem::replace(&mut self.state, to);
        self.observer.on_transition(from, to);
    }

    fn publish(&self, status: CallStatus) {
        self.observer.on_status(&status);
        self.status_tx.send_replace(status);
    }

    /// Routes an error to the status indicator. Capture failures end the call.
    async fn fail(&mut self, error: SessionError) {
        self.observer.on_error(&error);

        match &error {
            SessionError::MediaAcquisition(cause) => self.abandon_for_capture(cause.clone()).await,
            SessionError::CandidateApply(_) => {}
            SessionError::Negotiation(_) | SessionError::Media(_) => {
                if self.assess_viability() {
                    debug!("Ignoring negotiation error while media still flows: {}", error);
                } else {
                    self.publish(CallStatus::Failed {
                        reason: error.to_string(),
                    });
                }
            }
            SessionError::Transport(_) | SessionError::InvalidInput(_) => {
                self.publish(CallStatus::Error {
                    message: error.to_string(),
                });
            }
        }
    }

    async fn abandon_for_capture(&mut self, cause: CaptureFailure) {
        if let Some(room_id) = self.room_id.take()
            && let Err(e) = self.signals.send(ClientSignal::LeaveRoom { room_id }).await
        {
            warn!("Could not announce leave: {}", e);
        }

        self.teardown().await;
        self.peer_name = None;
        self.transition(SessionState::Closed);
        self.publish(CallStatus::Failed {
            reason: cause.to_string(),
        });
    }
}

fn validate_name(display_name: &str) -> Result<String, SessionError> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidInput(
            "display name must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
