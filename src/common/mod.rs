pub mod commands;
pub mod events;
pub mod types;

pub use commands::{Outbound, OutboundMessage};
pub use events::{Channel, TransportEvent};
pub use types::{
    ChatMessage, Conversation, DeleteNotice, MessageId, MessageType, Notification,
    NotificationKind, RecallNotice, ServerId, UserId, UserInfo,
};
