use serde::Deserialize;

use super::types::{ChatMessage, DeleteNotice, Notification, RecallNotice, UserId};

/// Per-user broker destinations the client subscribes to after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Messages,
    Typing,
    Recall,
    Delete,
    Errors,
    Notifications,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Messages,
        Channel::Typing,
        Channel::Recall,
        Channel::Delete,
        Channel::Errors,
        Channel::Notifications,
    ];

    pub fn destination(self) -> &'static str {
        match self {
            Self::Messages => "/user/queue/messages",
            Self::Typing => "/user/queue/typing",
            Self::Recall => "/user/queue/recall",
            Self::Delete => "/user/queue/delete",
            Self::Errors => "/user/queue/errors",
            Self::Notifications => "/user/queue/notifications",
        }
    }

    pub fn subscription_id(self) -> &'static str {
        match self {
            Self::Messages => "sub-messages",
            Self::Typing => "sub-typing",
            Self::Recall => "sub-recall",
            Self::Delete => "sub-delete",
            Self::Errors => "sub-errors",
            Self::Notifications => "sub-notifications",
        }
    }

    pub fn from_subscription_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.subscription_id() == id)
    }

    pub fn from_destination(destination: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.destination() == destination)
    }
}

/// Inbound events delivered by the transport, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Message(ChatMessage),
    Typing(UserId),
    Recall(RecallNotice),
    Delete(DeleteNotice),
    Notification(Notification),
    Error(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl TransportEvent {
    /// Decodes a frame body received on `channel`.
    pub fn decode(channel: Channel, body: &str) -> serde_json::Result<Self> {
        Ok(match channel {
            Channel::Messages => Self::Message(serde_json::from_str(body)?),
            Channel::Typing => Self::Typing(serde_json::from_str(body.trim())?),
            Channel::Recall => Self::Recall(serde_json::from_str(body)?),
            Channel::Delete => Self::Delete(serde_json::from_str(body)?),
            Channel::Notifications => Self::Notification(serde_json::from_str(body)?),
            Channel::Errors => Self::Error(decode_error_body(body)),
        })
    }
}

fn decode_error_body(body: &str) -> String {
    if let Ok(ErrorBody { message }) = serde_json::from_str::<ErrorBody>(body) {
        return message;
    }
    if let Ok(text) = serde_json::from_str::<String>(body) {
        return text;
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::ServerId;

    #[test]
    fn channels_resolve_by_subscription_and_destination() {
        for channel in Channel::ALL {
            assert_eq!(
                Channel::from_subscription_id(channel.subscription_id()),
                Some(channel)
            );
            assert_eq!(Channel::from_destination(channel.destination()), Some(channel));
        }
        assert_eq!(Channel::from_destination("/topic/other"), None);
    }

    #[test]
    fn typing_body_accepts_bare_or_quoted_ids() {
        assert_eq!(
            TransportEvent::decode(Channel::Typing, "42\n").unwrap(),
            TransportEvent::Typing(UserId(42))
        );
        assert_eq!(
            TransportEvent::decode(Channel::Typing, "\"42\"").unwrap(),
            TransportEvent::Typing(UserId(42))
        );
    }

    #[test]
    fn recall_body_decodes_string_ids() {
        let event = TransportEvent::decode(
            Channel::Recall,
            r#"{"messageId":"7123456789012345678","recalledAt":"2025-01-01T10:00:00"}"#,
        )
        .unwrap();
        match event {
            TransportEvent::Recall(notice) => {
                assert_eq!(notice.message_id, ServerId::new("7123456789012345678"));
                assert_eq!(notice.recalled_at.as_deref(), Some("2025-01-01T10:00:00"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn error_bodies_fall_back_to_raw_text() {
        let decode = |body| match TransportEvent::decode(Channel::Errors, body).unwrap() {
            TransportEvent::Error(message) => message,
            other => panic!("unexpected event {other:?}"),
        };
        assert_eq!(decode(r#"{"message":"rate limited"}"#), "rate limited");
        assert_eq!(decode("\"blocked\""), "blocked");
        assert_eq!(decode("plain failure"), "plain failure");
    }

    #[test]
    fn malformed_message_bodies_are_errors() {
        assert!(TransportEvent::decode(Channel::Messages, "{not json").is_err());
    }
}
