use crate::error::RelayError;
use crate::room::Room;
use parley_core::{ConnectionId, Participant, RoomId};
use std::collections::HashMap;
use tracing::{debug, info};

type IdSource = Box<dyn FnMut() -> RoomId + Send + Sync>;

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    /// The member that was already in the room and must learn about the joiner.
    pub existing: Option<Participant>,
    /// The joiner was already a member; nobody is notified again.
    pub rejoined: bool,
}

/// One membership removal. `remaining` is the member to notify with `peer-left`;
/// `None` means the room emptied and was destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub remaining: Option<ConnectionId>,
}

/// In-memory room table. Owned by exactly one task, which makes every mutation
/// serialized: two racing joins to a near-full room are applied one after the other.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    next_id: IdSource,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_id_source(RoomId::generate)
    }

    pub fn with_id_source<F>(next_id: F) -> Self
    where
        F: FnMut() -> RoomId + Send + Sync + 'static,
    {
        Self {
            rooms: HashMap::new(),
            next_id: Box::new(next_id),
        }
    }

    pub fn create_room(&mut self, founder: Participant) -> RoomId {
        let room_id = loop {
            let candidate = (self.next_id)();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            debug!("Room id {} already live, drawing another", candidate);
        };

        info!(
            "Room {} created by {} ({})",
            room_id, founder.display_name, founder.connection_id
        );
        self.rooms
            .insert(room_id.clone(), Room::new(room_id.clone(), founder));
        room_id
    }

    pub fn join_room(
        &mut self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<Joined, RelayError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.clone()))?;

        if room.contains(&participant.connection_id) {
            return Ok(Joined {
                existing: room.other_member(&participant.connection_id).cloned(),
                rejoined: true,
            });
        }

        if room.is_full() {
            return Err(RelayError::RoomFull(room_id.clone()));
        }

        let existing = room.other_member(&participant.connection_id).cloned();
        info!(
            "{} ({}) joined room {}",
            participant.display_name, participant.connection_id, room_id
        );
        room.add(participant);

        Ok(Joined {
            existing,
            rejoined: false,
        })
    }

    /// Idempotent: leaving a room you are not in, or that no longer exists, is a no-op.
    pub fn leave_room(
        &mut self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Option<Departure> {
        let room = self.rooms.get_mut(room_id)?;
        if !room.remove(connection_id) {
            return None;
        }

        let remaining = room.members().first().map(|m| m.connection_id);
        if room.is_empty() {
            self.rooms.remove(room_id);
            info!("Room {} destroyed", room_id);
        }

        Some(Departure {
            room_id: room_id.clone(),
            remaining,
        })
    }

    /// Removes the connection from every room it belongs to.
    pub fn leave_all(&mut self, connection_id: &ConnectionId) -> Vec<Departure> {
        let mut member_of: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.contains(connection_id))
            .map(|room| room.id().clone())
            .collect();
        member_of.sort();

        member_of
            .iter()
            .filter_map(|room_id| self.leave_room(room_id, connection_id))
            .collect()
    }

    /// The other member of `room_id`, after checking `sender` belongs to it.
    pub fn peer_of(
        &self,
        room_id: &RoomId,
        sender: &ConnectionId,
    ) -> Result<Option<&Participant>, RelayError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| RelayError::RoomNotFound(room_id.clone()))?;

        if !room.contains(sender) {
            return Err(RelayError::NotAMember(room_id.clone()));
        }

        Ok(room.other_member(sender))
    }

    /// First room (in id order) the connection belongs to.
    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&RoomId> {
        self.rooms
            .values()
            .filter(|room| room.contains(connection_id))
            .map(|room| room.id())
            .min()
    }

    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
