//! Strict FIFO matching of waiting participants

use super::Lobby;
use super::lifecycle::PAIRED_MESSAGE;
use strangers_protocol::{PeerId, ServerEvent};
use tracing::{info, warn};

impl Lobby {
    /// Queues `id` (if it is not already queued) and immediately tries to pair
    pub(super) fn enqueue(&mut self, id: PeerId) {
        self.queue.push(id);
        self.try_pair();
    }

    /// Matches the two oldest waiting participants until fewer than two remain
    pub(super) fn try_pair(&mut self) {
        while let Some((first, second)) = self.queue.pop_pair() {
            if first == second {
                warn!(peer_id = %first, "participant queued twice, dropping duplicate");
                self.queue.push_front(first);
                continue;
            }

            let first_ok = self.is_matchable(&first);
            let second_ok = self.is_matchable(&second);
            if !(first_ok && second_ok) {
                // Keep the surviving entry at the head so it does not lose its turn.
                for (id, ok) in [(second, second_ok), (first, first_ok)] {
                    if ok {
                        self.queue.push_front(id);
                    } else {
                        warn!(peer_id = %id, "discarding stale queue entry");
                    }
                }
                continue;
            }

            // Stale duplicates further back must not survive the match.
            self.queue.remove(&first);
            self.queue.remove(&second);

            let room_id = self.directory.create(first, second);
            info!(room_id = %room_id, first = %first, second = %second, "paired");

            for (member, other) in [(first, second), (second, first)] {
                let stranger_profile = self.registry.get(&other).and_then(|p| p.profile.clone());
                self.send(
                    &member,
                    ServerEvent::Paired {
                        message: PAIRED_MESSAGE.to_string(),
                        room_id: room_id.clone(),
                        stranger_profile,
                    },
                );
            }
        }
    }

    fn is_matchable(&self, id: &PeerId) -> bool {
        self.registry.contains(id) && self.directory.lookup(id).is_none()
    }
}
