//! Last-contact times of long-poll clients
//!
//! A long-poll client holds no open connection whose closing the server could notice, so the
//! transport records when each participant last polled or signaled. One that stays silent past
//! the configured timeout is treated as disconnected.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use strangers_protocol::PeerId;

#[derive(Debug, Default)]
pub(super) struct Liveness {
    last_seen: HashMap<PeerId, DateTime<Utc>>,
}

impl Liveness {
    pub fn touch(&mut self, id: PeerId, now: DateTime<Utc>) {
        self.last_seen.insert(id, now);
    }

    pub fn forget(&mut self, id: &PeerId) {
        self.last_seen.remove(id);
    }

    /// Participants last heard from before `cutoff`, longest silent first
    pub fn silent_since(&self, cutoff: DateTime<Utc>) -> Vec<PeerId> {
        let mut silent: Vec<(DateTime<Utc>, PeerId)> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| **seen < cutoff)
            .map(|(id, seen)| (*seen, *id))
            .collect();
        silent.sort();
        silent.into_iter().map(|(_, id)| id).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }
}
