//! Server state management
//!
//! All pairing and relay state lives in one [`Lobby`]: the connection registry, the waiting
//! queue, and the session directory. Every inbound event runs against it to completion,
//! including any pairing attempt and relay fan-out it causes, before the next event is
//! handled. [`ServerState`] is the cheap, clonable, single-threaded handle the transport uses.

mod directory;
mod lifecycle;
mod liveness;
mod pairing;
mod queue;
mod registry;
mod relay;
#[cfg(test)]
mod tests;

pub use directory::Session;
pub use lifecycle::{PAIRED_MESSAGE, REQUEUED_MESSAGE, STRANGER_LEFT_MESSAGE, WAITING_MESSAGE};

use crate::config::ServerConfig;
use crate::error::SignalingError;
use chrono::{DateTime, Utc};
use directory::SessionDirectory;
use liveness::Liveness;
use queue::WaitingQueue;
use registry::Registry;
use std::cell::RefCell;
use std::rc::Rc;
use strangers_protocol::{ClientRequest, PeerId, Profile, RoomId, ServerEvent};
use tracing::{debug, info};

/// Where a participant stands in the pairing lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    /// In the waiting queue
    Waiting,
    /// Member of a session
    Paired,
    /// Connected, neither queued nor paired (e.g. after the counterpart moved on)
    Idle,
}

/// Snapshot of one connected participant
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantState {
    pub id: PeerId,
    pub status: ParticipantStatus,
    pub profile: Option<Profile>,
    pub room_id: Option<RoomId>,
}

/// The single owner of all pairing and relay state
#[derive(Debug, Default)]
pub struct Lobby {
    registry: Registry,
    queue: WaitingQueue,
    directory: SessionDirectory,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one request from a connected participant
    ///
    /// Requests that need a session are dropped silently when the sender has none, as are
    /// directed signals to participants that are not connected.
    pub fn handle(&mut self, from: PeerId, request: ClientRequest) -> Result<(), SignalingError> {
        if !self.registry.contains(&from) {
            return Err(SignalingError::UnknownPeer);
        }
        debug!(peer_id = %from, event = request.kind(), "request");

        match request {
            ClientRequest::UserInfo { profile } => self.registry.set_profile(&from, profile)?,
            ClientRequest::ChatMessage { id, payload } => self.relay_chat(from, id, payload),
            ClientRequest::MessageSeen { id } => self.relay_seen(from, id),
            ClientRequest::Typing { is_typing } => {
                self.relay_to_peer(from, ServerEvent::Typing { is_typing });
            }
            ClientRequest::FindNext => self.find_next(from),
            ClientRequest::CallInitiate { call_type } => {
                self.relay_to_peer(from, ServerEvent::CallIncoming { call_type, from });
            }
            ClientRequest::CallAccept { to } => {
                self.relay_directed(from, to, ServerEvent::CallAccepted { from });
            }
            ClientRequest::CallReject { to } => {
                self.relay_directed(from, to, ServerEvent::CallRejected { from });
            }
            ClientRequest::CallEnd => {
                self.relay_to_peer(from, ServerEvent::CallEnded);
            }
            ClientRequest::WebrtcOffer { offer } => {
                self.relay_to_peer(from, ServerEvent::WebrtcOffer { offer, from });
            }
            ClientRequest::WebrtcAnswer { answer, to } => {
                self.relay_directed(from, to, ServerEvent::WebrtcAnswer { answer, from });
            }
            ClientRequest::WebrtcIceCandidate { candidate } => {
                self.relay_to_peer(from, ServerEvent::WebrtcIceCandidate { candidate, from });
            }
            ClientRequest::KeepAlive => {}
        }
        Ok(())
    }

    /// Takes the events queued for `id` since its last poll
    pub fn poll(&mut self, id: &PeerId) -> Result<Vec<ServerEvent>, SignalingError> {
        self.registry.drain(id)
    }

    pub fn status(&self, id: &PeerId) -> Option<ParticipantStatus> {
        if !self.registry.contains(id) {
            None
        } else if self.directory.lookup(id).is_some() {
            Some(ParticipantStatus::Paired)
        } else if self.queue.contains(id) {
            Some(ParticipantStatus::Waiting)
        } else {
            Some(ParticipantStatus::Idle)
        }
    }

    pub fn participant(&self, id: &PeerId) -> Option<ParticipantState> {
        let participant = self.registry.get(id)?;
        Some(ParticipantState {
            id: *id,
            status: self.status(id)?,
            profile: participant.profile.clone(),
            room_id: self.directory.lookup(id).cloned(),
        })
    }

    /// Session id of `id`'s current session
    pub fn room_of(&self, id: &PeerId) -> Option<RoomId> {
        self.directory.lookup(id).cloned()
    }

    pub fn session(&self, room_id: &RoomId) -> Option<Session> {
        self.directory.session(room_id).cloned()
    }

    /// Queued participants, oldest first
    pub fn waiting(&self) -> Vec<PeerId> {
        self.queue.iter().copied().collect()
    }

    pub fn participant_count(&self) -> usize {
        self.registry.len()
    }

    pub fn session_count(&self) -> usize {
        self.directory.len()
    }

    /// Queues `event` for `to`; a participant that is gone is skipped
    fn send(&mut self, to: &PeerId, event: ServerEvent) -> bool {
        match self.registry.deliver(to, event) {
            Ok(()) => true,
            Err(e) => {
                debug!(peer_id = %to, error = %e, "dropping event");
                false
            }
        }
    }
}

/// Shared handle to the [`Lobby`]
///
/// The WASI runtime is single-threaded, so the handle is an `Rc<RefCell<_>>`; borrows never
/// span an `.await`.
#[derive(Default, Clone)]
pub struct ServerState {
    lobby: Rc<RefCell<Lobby>>,
    liveness: Rc<RefCell<Liveness>>,
    config: Rc<ServerConfig>,
}

impl ServerState {
    /// Create a new server state handle with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            lobby: Rc::default(),
            liveness: Rc::default(),
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Connect a new participant, or poll for an existing one
    ///
    /// An unknown or absent `peer_id` connects a fresh participant with a new identity; there
    /// is no session resumption. Returns the participant's id and its pending events.
    pub fn connect_or_poll(&self, peer_id: Option<PeerId>) -> (PeerId, Vec<ServerEvent>) {
        if let Some(id) = peer_id {
            if let Ok(events) = self.poll(&id) {
                return (id, events);
            }
            debug!(peer_id = %id, "poll from unknown peer, connecting afresh");
        }
        let id = self.connect();
        let events = self.poll(&id).unwrap_or_default();
        (id, events)
    }

    pub fn connect(&self) -> PeerId {
        let id = self.lobby.borrow_mut().connect();
        self.liveness.borrow_mut().touch(id, Utc::now());
        id
    }

    /// Drain `id`'s events; counts as contact from `id`
    pub fn poll(&self, id: &PeerId) -> Result<Vec<ServerEvent>, SignalingError> {
        let events = self.lobby.borrow_mut().poll(id)?;
        self.liveness.borrow_mut().touch(*id, Utc::now());
        Ok(events)
    }

    /// Apply a request from a connected participant; counts as contact from `from`
    pub fn handle(&self, from: PeerId, request: ClientRequest) -> Result<(), SignalingError> {
        self.lobby.borrow_mut().handle(from, request)?;
        self.liveness.borrow_mut().touch(from, Utc::now());
        Ok(())
    }

    /// Remove a participant from the server. Returns whether it was connected.
    pub fn disconnect(&self, id: &PeerId) -> bool {
        self.liveness.borrow_mut().forget(id);
        self.lobby.borrow_mut().disconnect(id)
    }

    /// Disconnect everyone not heard from within the configured peer timeout, as of `now`
    ///
    /// Their counterparts are told the stranger left, exactly as for `POST /leave`. Returns the
    /// ids that were disconnected.
    pub fn disconnect_silent(&self, now: DateTime<Utc>) -> Vec<PeerId> {
        let Some(cutoff) = self
            .config
            .peer_timeout()
            .and_then(|timeout| now.checked_sub_signed(timeout))
        else {
            return Vec::new();
        };

        let silent = self.liveness.borrow().silent_since(cutoff);
        for id in &silent {
            info!(peer_id = %id, "peer went silent, disconnecting");
            self.disconnect(id);
        }
        silent
    }

    pub fn status(&self, id: &PeerId) -> Option<ParticipantStatus> {
        self.lobby.borrow().status(id)
    }

    pub fn participant(&self, id: &PeerId) -> Option<ParticipantState> {
        self.lobby.borrow().participant(id)
    }

    pub fn room_of(&self, id: &PeerId) -> Option<RoomId> {
        self.lobby.borrow().room_of(id)
    }

    pub fn session(&self, room_id: &RoomId) -> Option<Session> {
        self.lobby.borrow().session(room_id)
    }

    pub fn waiting(&self) -> Vec<PeerId> {
        self.lobby.borrow().waiting()
    }

    pub fn participant_count(&self) -> usize {
        self.lobby.borrow().participant_count()
    }

    pub fn session_count(&self) -> usize {
        self.lobby.borrow().session_count()
    }
}
