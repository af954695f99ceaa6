use crate::event::CallType;
use crate::{ChatPayload, MessageId, PeerId, Profile, ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Requests a connected participant sends to the server
///
/// Connecting and disconnecting are not requests; the transport reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientRequest {
    /// Replace the sender's profile metadata
    UserInfo { profile: Profile },
    /// Chat message for the current counterpart. Every field besides `event` and `id` is
    /// collected into `payload`, which is opaque to the server.
    ChatMessage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<MessageId>,
        #[serde(flatten)]
        payload: ChatPayload,
    },
    /// The sender has displayed the counterpart's message `id`
    MessageSeen { id: MessageId },
    Typing { is_typing: bool },
    /// Leave the current session (if any) and queue for a new stranger
    FindNext,
    CallInitiate { call_type: CallType },
    /// Directed at the caller named by `to`
    CallAccept { to: PeerId },
    /// Directed at the caller named by `to`
    CallReject { to: PeerId },
    CallEnd,
    WebrtcOffer { offer: Value },
    /// Directed at the offerer named by `to`
    WebrtcAnswer { answer: Value, to: PeerId },
    WebrtcIceCandidate { candidate: Value },
    /// Transport keep-alive, ignored by the lobby
    KeepAlive,
}

impl ClientRequest {
    /// Event name as it appears on the wire, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserInfo { .. } => "userInfo",
            Self::ChatMessage { .. } => "chatMessage",
            Self::MessageSeen { .. } => "messageSeen",
            Self::Typing { .. } => "typing",
            Self::FindNext => "findNext",
            Self::CallInitiate { .. } => "callInitiate",
            Self::CallAccept { .. } => "callAccept",
            Self::CallReject { .. } => "callReject",
            Self::CallEnd => "callEnd",
            Self::WebrtcOffer { .. } => "webrtcOffer",
            Self::WebrtcAnswer { .. } => "webrtcAnswer",
            Self::WebrtcIceCandidate { .. } => "webrtcIceCandidate",
            Self::KeepAlive => "keepAlive",
        }
    }
}

impl FromStr for ClientRequest {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl fmt::Display for ClientRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> ChatPayload {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn chat_message_id_is_optional() {
        let request: ClientRequest = r#"{"event":"chatMessage","message":"hi"}"#.parse().unwrap();
        assert_eq!(
            request,
            ClientRequest::ChatMessage {
                id: None,
                payload: fields(json!({"message": "hi"})),
            }
        );
    }

    #[test]
    fn chat_fields_sit_beside_the_tag() {
        let text = r#"{"event":"chatMessage","id":"m-1","type":"image","mediaUrl":"data:,x","userName":"ana"}"#;
        let request: ClientRequest = text.parse().unwrap();
        assert_eq!(
            request,
            ClientRequest::ChatMessage {
                id: Some(MessageId::from("m-1")),
                payload: fields(json!({"type": "image", "mediaUrl": "data:,x", "userName": "ana"})),
            }
        );
        let value: Value = serde_json::from_str(&request.to_string()).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(text).unwrap());
    }

    #[test]
    fn profile_values_may_be_any_json() {
        let text = r#"{"event":"userInfo","profile":{"userName":"ana","age":25,"interests":["chess"]}}"#;
        let request: ClientRequest = text.parse().unwrap();
        let ClientRequest::UserInfo { profile } = request else {
            panic!("expected userInfo");
        };
        assert_eq!(profile["userName"], "ana");
        assert_eq!(profile["age"], 25);
        assert_eq!(profile["interests"], json!(["chess"]));
    }

    #[test]
    fn unit_requests_need_only_the_tag() {
        let request: ClientRequest = r#"{"event":"findNext"}"#.parse().unwrap();
        assert_eq!(request, ClientRequest::FindNext);
        let request: ClientRequest = r#"{"event":"callEnd"}"#.parse().unwrap();
        assert_eq!(request, ClientRequest::CallEnd);
    }

    #[test]
    fn fields_are_camel_case() {
        let request: ClientRequest = r#"{"event":"typing","isTyping":true}"#.parse().unwrap();
        assert_eq!(request, ClientRequest::Typing { is_typing: true });

        let request: ClientRequest =
            r#"{"event":"callInitiate","callType":"video"}"#.parse().unwrap();
        assert_eq!(
            request,
            ClientRequest::CallInitiate {
                call_type: CallType::Video
            }
        );
    }

    #[test]
    fn directed_answer_carries_target() {
        let to = PeerId::random();
        let text = json!({"event": "webrtcAnswer", "answer": {"sdp": "v=0"}, "to": to}).to_string();
        let request: ClientRequest = text.parse().unwrap();
        assert_eq!(
            request,
            ClientRequest::WebrtcAnswer {
                answer: json!({"sdp": "v=0"}),
                to,
            }
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = r#"{"event":"joinRoom","room":"x"}"#.parse::<ClientRequest>();
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn display_is_wire_json() {
        let text = ClientRequest::MessageSeen {
            id: MessageId::from("m-1"),
        }
        .to_string();
        assert_eq!(text, r#"{"event":"messageSeen","id":"m-1"}"#);
    }
}
