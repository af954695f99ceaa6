//! Connect, find-next and disconnect transitions

use super::Lobby;
use chrono::Utc;
use strangers_protocol::{PeerId, RoomId, ServerEvent};
use tracing::info;

pub const WAITING_MESSAGE: &str = "Looking for a stranger...";
pub const REQUEUED_MESSAGE: &str = "Looking for a new stranger...";
pub const PAIRED_MESSAGE: &str = "You are now connected with a stranger!";
pub const STRANGER_LEFT_MESSAGE: &str = "Stranger has disconnected.";

impl Lobby {
    /// Registers a new participant and queues it for a match
    pub fn connect(&mut self) -> PeerId {
        let id = self.registry.register();
        info!(peer_id = %id, "connected");
        self.send(
            &id,
            ServerEvent::Waiting {
                message: WAITING_MESSAGE.to_string(),
            },
        );
        self.enqueue(id);
        id
    }

    /// Leaves the current session, if any, and queues `id` for a new stranger
    ///
    /// The abandoned counterpart is told the stranger left but is not queued again; it has to
    /// ask for its own next match.
    pub(super) fn find_next(&mut self, id: PeerId) {
        if let Some(room_id) = self.directory.lookup(&id).cloned() {
            self.leave_session(id, &room_id);
            info!(peer_id = %id, room_id = %room_id, "left session for next stranger");
        }

        self.queue.remove(&id);
        self.send(
            &id,
            ServerEvent::Waiting {
                message: REQUEUED_MESSAGE.to_string(),
            },
        );
        self.enqueue(id);
    }

    /// Purges a participant, ending its session if it had one. Returns whether it was connected.
    pub fn disconnect(&mut self, id: &PeerId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }

        self.queue.remove(id);
        if let Some(room_id) = self.directory.lookup(id).cloned() {
            self.leave_session(*id, &room_id);
        }
        if let Some(participant) = self.registry.remove(id) {
            let connected_secs = (Utc::now() - participant.connected_at).num_seconds();
            info!(peer_id = %id, connected_secs, "disconnected");
        }
        true
    }

    /// Tells the other member `id` has gone and tears the session down
    fn leave_session(&mut self, id: PeerId, room_id: &RoomId) {
        if let Some(peer) = self.directory.peer_of(&id) {
            self.send(
                &peer,
                ServerEvent::StrangerLeft {
                    message: STRANGER_LEFT_MESSAGE.to_string(),
                },
            );
        }
        self.directory.teardown(room_id);
    }
}
