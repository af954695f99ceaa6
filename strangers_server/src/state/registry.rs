//! Connected participants and their pending outbound events

use crate::error::SignalingError;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use strangers_protocol::{PeerId, Profile, ServerEvent};

/// A connected participant
#[derive(Debug, Clone)]
pub(crate) struct Participant {
    pub profile: Option<Profile>,
    pub connected_at: DateTime<Utc>,
    /// Events waiting for the participant's next poll
    outbox: VecDeque<ServerEvent>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Registry {
    participants: HashMap<PeerId, Participant>,
}

impl Registry {
    /// Registers a new participant under a fresh id
    pub fn register(&mut self) -> PeerId {
        let mut id = PeerId::random();
        while self.participants.contains_key(&id) {
            id = PeerId::random();
        }
        self.participants.insert(
            id,
            Participant {
                profile: None,
                connected_at: Utc::now(),
                outbox: VecDeque::new(),
            },
        );
        id
    }

    /// Forgets the participant, discarding anything still in its outbox
    pub fn remove(&mut self, id: &PeerId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn get(&self, id: &PeerId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn set_profile(&mut self, id: &PeerId, profile: Profile) -> Result<(), SignalingError> {
        let participant = self
            .participants
            .get_mut(id)
            .ok_or(SignalingError::UnknownPeer)?;
        participant.profile = Some(profile);
        Ok(())
    }

    /// Queues an event for a participant
    pub fn deliver(&mut self, id: &PeerId, event: ServerEvent) -> Result<(), SignalingError> {
        let participant = self
            .participants
            .get_mut(id)
            .ok_or(SignalingError::UnknownPeer)?;
        participant.outbox.push_back(event);
        Ok(())
    }

    /// Takes everything queued for a participant, oldest first
    pub fn drain(&mut self, id: &PeerId) -> Result<Vec<ServerEvent>, SignalingError> {
        let participant = self
            .participants
            .get_mut(id)
            .ok_or(SignalingError::UnknownPeer)?;
        Ok(participant.outbox.drain(..).collect())
    }

    #[cfg(test)]
    pub fn ids(&self) -> impl Iterator<Item = &PeerId> {
        self.participants.keys()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }
}
