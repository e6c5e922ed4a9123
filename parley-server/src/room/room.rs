use parley_core::utils::ROOM_CAPACITY;
use parley_core::{ConnectionId, Participant, RoomId};

/// A two-party pairing context. Lives while it has at least one member.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    members: Vec<Participant>,
}

impl Room {
    pub(crate) fn new(id: RoomId, founder: Participant) -> Self {
        Self {
            id,
            members: vec![founder],
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members
            .iter()
            .any(|m| &m.connection_id == connection_id)
    }

    /// The member that is not `connection_id`, if any.
    pub fn other_member(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.members
            .iter()
            .find(|m| &m.connection_id != connection_id)
    }

    pub(crate) fn add(&mut self, participant: Participant) {
        debug_assert!(!self.is_full());
        self.members.push(participant);
    }

    /// Returns whether the member was present.
    pub(crate) fn remove(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| &m.connection_id != connection_id);
        before != self.members.len()
    }
}
