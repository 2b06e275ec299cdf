use serde::Serialize;

use super::types::{MessageType, UserId};

pub const CONNECT_DESTINATION: &str = "/app/chat.connect";
pub const SEND_DESTINATION: &str = "/app/chat.send";
pub const TYPING_DESTINATION: &str = "/app/chat.typing";

/// Body of a chat send. `client_msg_id` is echoed back on the
/// acknowledging message so the optimistic entry can be matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub receiver_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    pub client_msg_id: String,
}

/// Frames the client publishes to the broker's application destinations.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Sent once per session right after the subscriptions are in place.
    ConnectAck,
    Message(OutboundMessage),
    /// Tells the receiver that the local user is typing.
    Typing(UserId),
}

impl Outbound {
    pub fn destination(&self) -> &'static str {
        match self {
            Self::ConnectAck => CONNECT_DESTINATION,
            Self::Message(_) => SEND_DESTINATION,
            Self::Typing(_) => TYPING_DESTINATION,
        }
    }

    pub fn body(&self) -> serde_json::Result<String> {
        match self {
            Self::ConnectAck => Ok("{}".to_string()),
            Self::Message(message) => serde_json::to_string(message),
            Self::Typing(receiver) => serde_json::to_string(receiver),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_send_body_carries_correlation_token() {
        let outbound = Outbound::Message(OutboundMessage {
            receiver_id: UserId(42),
            content: "hi".to_string(),
            message_type: MessageType::Text,
            client_msg_id: "c0ffee".to_string(),
        });

        assert_eq!(outbound.destination(), "/app/chat.send");
        let body: serde_json::Value = serde_json::from_str(&outbound.body().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "receiverId": 42,
                "content": "hi",
                "messageType": "TEXT",
                "clientMsgId": "c0ffee"
            })
        );
    }

    #[test]
    fn typing_body_is_bare_receiver_id() {
        let outbound = Outbound::Typing(UserId(7));
        assert_eq!(outbound.destination(), "/app/chat.typing");
        assert_eq!(outbound.body().unwrap(), "7");
        assert_eq!(Outbound::ConnectAck.body().unwrap(), "{}");
    }
}
