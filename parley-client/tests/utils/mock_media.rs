use async_trait::async_trait;
use parley_client::CaptureFailure;
use parley_client::media::{
    AudioSource, MediaConnection, MediaError, MediaEventKind, MediaEventSender,
    MediaStack, SdpKind,
};
use parley_client::session::PathEvidence;
use parley_core::{IceCandidate, IceServerConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Every call the session made into the media stack, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    CreateConnection { id: usize },
    AcquireAudio { id: usize },
    Attach { connection: usize, audio: usize },
    CreateOffer { connection: usize },
    CreateAnswer { connection: usize },
    SetLocal { connection: usize, kind: SdpKind, sdp: String },
    SetRemote { connection: usize, kind: SdpKind, sdp: String },
    AddCandidate { connection: usize, candidate: String },
    Close { connection: usize },
    SetEnabled { audio: usize, enabled: bool },
    StopAudio { audio: usize },
}

#[derive(Default)]
struct Script {
    log: Mutex<Vec<MediaCall>>,
    next_id: AtomicUsize,
    capture_failure: Mutex<Option<CaptureFailure>>,
    reject_candidates: AtomicBool,
    evidence: Mutex<PathEvidence>,
    senders: Mutex<Vec<MediaEventSender>>,
}

impl Script {
    fn record(&self, call: MediaCall) {
        self.log.lock().unwrap().push(call);
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Scripted media stack. Clones share the same log and knobs, so a test keeps
/// one clone while the session owns another.
#[derive(Clone, Default)]
pub struct MockMediaStack {
    script: Arc<Script>,
}

impl MockMediaStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MediaCall> {
        self.script.log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.script.log.lock().unwrap().clear();
    }

    /// Candidates applied to the given connection, in order.
    pub fn applied_candidates(&self, connection: usize) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MediaCall::AddCandidate {
                    connection: c,
                    candidate,
                } if c == connection => Some(candidate),
                _ => None,
            })
            .collect()
    }

    pub fn fail_capture_with(&self, failure: CaptureFailure) {
        *self.script.capture_failure.lock().unwrap() = Some(failure);
    }

    pub fn reject_candidates(&self, reject: bool) {
        self.script.reject_candidates.store(reject, Ordering::SeqCst);
    }

    pub fn set_evidence(&self, evidence: PathEvidence) {
        *self.script.evidence.lock().unwrap() = evidence;
    }

    /// Emits an event as the most recently created connection.
    pub fn emit(&self, kind: MediaEventKind) {
        let senders = self.script.senders.lock().unwrap();
        let sender = senders.last().expect("a media connection exists");
        sender.send(kind);
    }

    /// Emits an event as the connection created `index`-th (1-based).
    pub fn emit_from(&self, index: usize, kind: MediaEventKind) {
        let senders = self.script.senders.lock().unwrap();
        senders[index - 1].send(kind);
    }
}

#[async_trait]
impl MediaStack for MockMediaStack {
    type Audio = MockAudio;
    type Connection = MockConnection;

    async fn create_connection(
        &self,
        _ice_servers: &[IceServerConfig],
        events: MediaEventSender,
    ) -> Result<MockConnection, MediaError> {
        let id = self.script.next_id();
        self.script.record(MediaCall::CreateConnection { id });
        self.script.senders.lock().unwrap().push(events);

        Ok(MockConnection {
            id,
            script: self.script.clone(),
        })
    }

    async fn acquire_audio(&self) -> Result<MockAudio, CaptureFailure> {
        if let Some(failure) = self.script.capture_failure.lock().unwrap().clone() {
            return Err(failure);
        }

        let id = self.script.next_id();
        self.script.record(MediaCall::AcquireAudio { id });
        Ok(MockAudio {
            id,
            script: self.script.clone(),
        })
    }
}

pub struct MockAudio {
    pub id: usize,
    script: Arc<Script>,
}

impl AudioSource for MockAudio {
    fn set_enabled(&self, enabled: bool) {
        self.script.record(MediaCall::SetEnabled {
            audio: self.id,
            enabled,
        });
    }

    fn stop(&self) {
        self.script.record(MediaCall::StopAudio { audio: self.id });
    }
}

pub struct MockConnection {
    pub id: usize,
    script: Arc<Script>,
}

#[async_trait]
impl MediaConnection for MockConnection {
    type Audio = MockAudio;

    async fn attach_audio(&self, audio: &MockAudio) -> Result<(), MediaError> {
        self.script.record(MediaCall::Attach {
            connection: self.id,
            audio: audio.id,
        });
        Ok(())
    }

    async fn create_offer(&self) -> Result<String, MediaError> {
        self.script.record(MediaCall::CreateOffer {
            connection: self.id,
        });
        Ok(format!("offer-{}", self.id))
    }

    async fn create_answer(&self) -> Result<String, MediaError> {
        self.script.record(MediaCall::CreateAnswer {
            connection: self.id,
        });
        Ok(format!("answer-{}", self.id))
    }

    async fn set_local_description(&self, kind: SdpKind, sdp: String) -> Result<(), MediaError> {
        self.script.record(MediaCall::SetLocal {
            connection: self.id,
            kind,
            sdp,
        });
        Ok(())
    }

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<(), MediaError> {
        self.script.record(MediaCall::SetRemote {
            connection: self.id,
            kind,
            sdp,
        });
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<(), MediaError> {
        self.script.record(MediaCall::AddCandidate {
            connection: self.id,
            candidate: candidate.candidate.clone(),
        });
        if self.script.reject_candidates.load(Ordering::SeqCst) {
            return Err(MediaError::Candidate(candidate.candidate));
        }
        Ok(())
    }

    fn evidence(&self) -> PathEvidence {
        *self.script.evidence.lock().unwrap()
    }

    async fn close(&self) {
        self.script.record(MediaCall::Close {
            connection: self.id,
        });
    }
}
