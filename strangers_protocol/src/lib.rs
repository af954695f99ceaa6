//! Wire protocol for the stranger-pairing signaling server
//!
//! Clients talk to the server with a closed set of [`ClientRequest`]s and receive a closed set of
//! [`ServerEvent`]s. Both are JSON objects tagged by an `"event"` field with camelCase names:
//!
//! ```json
//! {"event": "chatMessage", "message": "hi", "type": "text"}
//! {"event": "messageStatus", "id": "8c0c…", "status": "delivered"}
//! ```
//!
//! Participants are identified by a [`PeerId`] that is only valid for the lifetime of one
//! connection. Sessions ("rooms") are identified by a [`RoomId`].

#![forbid(unsafe_code)]

mod error;
mod event;
mod ids;
mod request;

pub use error::ProtocolError;
pub use event::{CallType, MessageStatus, PollResponse, Sender, ServerEvent};
pub use ids::{ChatPayload, MessageId, PeerId, Profile, RoomId};
pub use request::ClientRequest;
