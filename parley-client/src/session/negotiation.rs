use crate::session::Role;
use parley_core::IceCandidate;
use std::collections::VecDeque;

/// What to do with a remote candidate right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateDisposition {
    Apply(IceCandidate),
    Queued { pending: usize },
}

/// Candidate bookkeeping for one negotiation.
///
/// Candidates trickle in independently of the offer/answer exchange. Until the
/// remote description is applied they are held here in arrival order; applying
/// the description releases them exactly once.
#[derive(Debug, Default)]
pub struct NegotiationSession {
    role: Option<Role>,
    remote_applied: bool,
    pending: VecDeque<IceCandidate>,
}

impl NegotiationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn remote_applied(&self) -> bool {
        self.remote_applied
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Starts a new description exchange. Already queued candidates are kept:
    /// they may have raced ahead of the offer that is about to be applied.
    pub fn begin(&mut self, role: Role) {
        self.role = Some(role);
        self.remote_applied = false;
    }

    pub fn accept_candidate(&mut self, candidate: IceCandidate) -> CandidateDisposition {
        if self.remote_applied {
            return CandidateDisposition::Apply(candidate);
        }

        self.pending.push_back(candidate);
        CandidateDisposition::Queued {
            pending: self.pending.len(),
        }
    }

    /// Records that the remote description is in place and hands back every
    /// queued candidate, oldest first.
    pub fn mark_remote_applied(&mut self) -> Vec<IceCandidate> {
        self.remote_applied = true;
        self.pending.drain(..).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
