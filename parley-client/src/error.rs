use crate::media::MediaError;

/// Why local audio capture could not be started. The `Display` text is the
/// guidance shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureFailure {
    #[error("Microphone access was denied. Allow microphone access and try again.")]
    PermissionDenied,
    #[error("No microphone was found. Connect one and try again.")]
    DeviceAbsent,
    #[error("Could not start the microphone ({0}). Check your audio device settings.")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    MediaAcquisition(#[from] CaptureFailure),
    #[error("negotiation failed: {0}")]
    Negotiation(String),
    #[error("failed to apply candidate: {0}")]
    CandidateApply(String),
    #[error("signaling transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

