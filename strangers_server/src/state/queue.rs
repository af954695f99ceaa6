//! FIFO pool of participants waiting for a match

use std::collections::VecDeque;
use strangers_protocol::PeerId;

#[derive(Debug, Default, Clone)]
pub(crate) struct WaitingQueue {
    ids: VecDeque<PeerId>,
}

impl WaitingQueue {
    /// Appends `id` unless it is already queued. Returns whether it was added.
    pub fn push(&mut self, id: PeerId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.ids.push_back(id);
        true
    }

    /// Removes every occurrence of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &PeerId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|queued| queued != id);
        self.ids.len() != before
    }

    /// Takes the two oldest entries, if there are at least two
    pub fn pop_pair(&mut self) -> Option<(PeerId, PeerId)> {
        if self.ids.len() < 2 {
            return None;
        }
        let first = self.ids.pop_front()?;
        let second = self.ids.pop_front()?;
        Some((first, second))
    }

    /// Returns `id` to the head of the queue, ahead of everyone else
    pub fn push_front(&mut self, id: PeerId) {
        self.ids.push_front(id);
    }

    pub fn contains(&self, id: &PeerId) -> bool {
        self.ids.contains(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerId> {
        self.ids.iter()
    }

    /// Appends without the duplicate check, to simulate corrupted state
    #[cfg(test)]
    pub fn push_unchecked(&mut self, id: PeerId) {
        self.ids.push_back(id);
    }
}
