//! Bidirectional mapping between participants and their two-party sessions

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use strangers_protocol::{PeerId, RoomId};

/// An active pairing of exactly two distinct participants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: RoomId,
    pub members: [PeerId; 2],
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// The member that is not `id`, if `id` belongs to this session
    pub fn peer_of(&self, id: &PeerId) -> Option<PeerId> {
        match self.members {
            [a, b] if a == *id => Some(b),
            [a, b] if b == *id => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct SessionDirectory {
    by_peer: HashMap<PeerId, RoomId>,
    sessions: HashMap<RoomId, Session>,
}

impl SessionDirectory {
    /// Records a session for `a` and `b` and returns its id
    ///
    /// Callers guarantee `a != b` and that neither is already in a session.
    pub fn create(&mut self, a: PeerId, b: PeerId) -> RoomId {
        debug_assert_ne!(a, b);
        debug_assert!(self.lookup(&a).is_none() && self.lookup(&b).is_none());

        let room_id = RoomId::for_pair(a, b);
        let session = Session {
            id: room_id.clone(),
            members: [a, b],
            created_at: Utc::now(),
        };
        self.by_peer.insert(a, room_id.clone());
        self.by_peer.insert(b, room_id.clone());
        self.sessions.insert(room_id.clone(), session);
        room_id
    }

    pub fn lookup(&self, id: &PeerId) -> Option<&RoomId> {
        self.by_peer.get(id)
    }

    pub fn session(&self, room_id: &RoomId) -> Option<&Session> {
        self.sessions.get(room_id)
    }

    /// The other member of `id`'s session
    pub fn peer_of(&self, id: &PeerId) -> Option<PeerId> {
        self.lookup(id)
            .and_then(|room_id| self.sessions.get(room_id))
            .and_then(|session| session.peer_of(id))
    }

    /// Removes the session and both member mappings, returning the former members
    ///
    /// A second teardown of the same room is a no-op.
    pub fn teardown(&mut self, room_id: &RoomId) -> Option<[PeerId; 2]> {
        let session = self.sessions.remove(room_id)?;
        for member in &session.members {
            if self.by_peer.get(member) == Some(room_id) {
                self.by_peer.remove(member);
            }
        }
        Some(session.members)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_maps_both_members() {
        let mut directory = SessionDirectory::default();
        let (a, b) = (PeerId::random(), PeerId::random());
        let room_id = directory.create(a, b);

        assert_eq!(directory.lookup(&a), Some(&room_id));
        assert_eq!(directory.lookup(&b), Some(&room_id));
        assert_eq!(directory.peer_of(&a), Some(b));
        assert_eq!(directory.peer_of(&b), Some(a));
        assert_eq!(directory.session(&room_id).unwrap().members, [a, b]);
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut directory = SessionDirectory::default();
        let (a, b) = (PeerId::random(), PeerId::random());
        let room_id = directory.create(a, b);

        assert_eq!(directory.teardown(&room_id), Some([a, b]));
        assert_eq!(directory.teardown(&room_id), None);
        assert!(directory.lookup(&a).is_none());
        assert!(directory.lookup(&b).is_none());
        assert_eq!(directory.len(), 0);
    }

    #[test]
    fn same_pair_can_meet_again_after_teardown() {
        let mut directory = SessionDirectory::default();
        let (a, b) = (PeerId::random(), PeerId::random());
        let first = directory.create(a, b);
        directory.teardown(&first);
        let second = directory.create(a, b);

        assert_eq!(first, second);
        assert_eq!(directory.peer_of(&a), Some(b));
    }

    #[test]
    fn stranger_is_not_a_peer() {
        let session = Session {
            id: RoomId("room".to_string()),
            members: [PeerId::random(), PeerId::random()],
            created_at: Utc::now(),
        };
        assert_eq!(session.peer_of(&PeerId::random()), None);
    }
}
