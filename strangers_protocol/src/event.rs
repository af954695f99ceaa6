use crate::{ChatPayload, MessageId, PeerId, Profile, ProtocolError, RoomId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Media requested by `callInitiate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Audio,
    Video,
}

/// Delivery state of a chat message, reported back to its author
///
/// A message moves `Sent → Delivered → Seen`. `Delivered` means the relay handed the message
/// to the counterpart's channel, not that the counterpart rendered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Seen,
}

/// Who a relayed chat message is attributed to
///
/// Participants are anonymous to each other, so the only author a client ever sees is the
/// counterpart marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Stranger,
}

/// Events the server delivers to a participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Queued for a match
    Waiting { message: String },
    /// Matched into `room_id`
    Paired {
        message: String,
        room_id: RoomId,
        /// The counterpart's `userInfo`, if it sent any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stranger_profile: Option<Profile>,
    },
    /// The author's chat fields, flattened beside `id` and `sender`
    ChatMessage {
        id: MessageId,
        #[serde(flatten)]
        payload: ChatPayload,
        sender: Sender,
    },
    MessageStatus { id: MessageId, status: MessageStatus },
    Typing { is_typing: bool },
    /// The counterpart moved on or disconnected; the session is gone
    StrangerLeft { message: String },
    CallIncoming { call_type: CallType, from: PeerId },
    CallAccepted { from: PeerId },
    CallRejected { from: PeerId },
    CallEnded,
    WebrtcOffer { offer: Value, from: PeerId },
    WebrtcAnswer { answer: Value, from: PeerId },
    WebrtcIceCandidate { candidate: Value, from: PeerId },
}

impl FromStr for ServerEvent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Body of a long-poll response: the caller's id and everything queued for it since the last poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub peer_id: PeerId,
    pub events: Vec<ServerEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paired_uses_room_id_key() {
        let event = ServerEvent::Paired {
            message: "hello".to_string(),
            room_id: RoomId("room-1".to_string()),
            stranger_profile: None,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "paired", "message": "hello", "roomId": "room-1"})
        );
    }

    #[test]
    fn relayed_chat_is_attributed_to_stranger() {
        let event = ServerEvent::ChatMessage {
            id: MessageId::from("m-1"),
            payload: ChatPayload::from_iter([
                ("message".to_string(), json!("hi")),
                ("type".to_string(), json!("text")),
            ]),
            sender: Sender::Stranger,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "chatMessage",
                "id": "m-1",
                "message": "hi",
                "type": "text",
                "sender": "stranger",
            })
        );
        assert_eq!(value.to_string().parse::<ServerEvent>().unwrap(), event);
    }

    #[test]
    fn message_status_is_lowercase() {
        let text = ServerEvent::MessageStatus {
            id: MessageId::from("m-1"),
            status: MessageStatus::Delivered,
        }
        .to_string();
        assert_eq!(
            text,
            r#"{"event":"messageStatus","id":"m-1","status":"delivered"}"#
        );
    }

    #[test]
    fn statuses_are_ordered_by_progress() {
        assert!(MessageStatus::Sent < MessageStatus::Delivered);
        assert!(MessageStatus::Delivered < MessageStatus::Seen);
    }

    #[test]
    fn call_ended_parses_back() {
        let event: ServerEvent = ServerEvent::CallEnded.to_string().parse().unwrap();
        assert_eq!(event, ServerEvent::CallEnded);
    }

    #[test]
    fn incoming_call_names_the_caller() {
        let from = PeerId::random();
        let value = serde_json::to_value(ServerEvent::CallIncoming {
            call_type: CallType::Audio,
            from,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"event": "callIncoming", "callType": "audio", "from": from.to_string()})
        );
    }
}
