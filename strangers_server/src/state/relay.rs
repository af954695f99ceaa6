//! Relaying chat, receipts, typing and call signaling between session members
//!
//! Nothing relayed here is stored. Chat messages report `Sent` and `Delivered` back to their
//! author as they pass through; `Seen` is forwarded when the counterpart reports it.
//!
//! Signaling uses two addressing modes. Call initiation, offers, ICE candidates and call end go
//! to "the rest of the session", which is always the one other member. Call accept/reject and
//! answers go to the explicit `to` id the client supplies, whether or not it still shares a
//! session with the sender.

use super::Lobby;
use strangers_protocol::{ChatPayload, MessageId, MessageStatus, PeerId, Sender, ServerEvent};
use tracing::debug;

impl Lobby {
    pub(super) fn relay_chat(
        &mut self,
        from: PeerId,
        id: Option<MessageId>,
        mut payload: ChatPayload,
    ) {
        let Some(peer) = self.directory.peer_of(&from) else {
            debug!(peer_id = %from, "chat message from unpaired peer dropped");
            return;
        };
        let id = id.unwrap_or_else(MessageId::generate);
        // The author is always reported as the stranger.
        payload.remove("sender");

        self.send(
            &from,
            ServerEvent::MessageStatus {
                id: id.clone(),
                status: MessageStatus::Sent,
            },
        );
        let delivered = self.send(
            &peer,
            ServerEvent::ChatMessage {
                id: id.clone(),
                payload,
                sender: Sender::Stranger,
            },
        );
        if delivered {
            debug!(peer_id = %from, to = %peer, message_id = %id, "chat message relayed");
            self.send(
                &from,
                ServerEvent::MessageStatus {
                    id,
                    status: MessageStatus::Delivered,
                },
            );
        }
    }

    /// Forwards a read receipt; `id` is not checked against anything
    pub(super) fn relay_seen(&mut self, from: PeerId, id: MessageId) {
        self.relay_to_peer(
            from,
            ServerEvent::MessageStatus {
                id,
                status: MessageStatus::Seen,
            },
        );
    }

    /// Sends `event` to the other member of `from`'s session. Returns whether it was queued.
    pub(super) fn relay_to_peer(&mut self, from: PeerId, event: ServerEvent) -> bool {
        match self.directory.peer_of(&from) {
            Some(peer) => self.send(&peer, event),
            None => {
                debug!(peer_id = %from, "relay from unpaired peer dropped");
                false
            }
        }
    }

    /// Sends `event` to `to` if it is connected. Returns whether it was queued.
    pub(super) fn relay_directed(&mut self, from: PeerId, to: PeerId, event: ServerEvent) -> bool {
        if from == to {
            debug!(peer_id = %from, "directed signal to self dropped");
            return false;
        }
        self.send(&to, event)
    }
}
