/// Inbound media facts reported by the media connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathEvidence {
    pub live_remote_tracks: usize,
    pub muted_remote_tracks: usize,
    pub packets_received: u64,
}

impl PathEvidence {
    pub fn unmuted_tracks(&self) -> usize {
        self.live_remote_tracks
            .saturating_sub(self.muted_remote_tracks)
    }
}

/// Decides whether a troubled media path is still carrying audio.
///
/// A path is viable when packets arrived since the previous assessment. On the
/// very first assessment there is nothing to compare against, so a live
/// unmuted remote track is accepted instead.
#[derive(Debug, Default)]
pub struct ViabilityProbe {
    last: Option<PathEvidence>,
}

impl ViabilityProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assess(&mut self, evidence: PathEvidence) -> bool {
        let viable = match self.last {
            Some(previous) => evidence.packets_received > previous.packets_received,
            None => evidence.unmuted_tracks() > 0,
        };
        self.last = Some(evidence);
        viable
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
