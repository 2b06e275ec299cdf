use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reads a field that the server may send as `null`, falling back to the default.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Numeric ids arrive either as JSON numbers or as decimal strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl LooseId {
    fn into_decimal(self) -> String {
        match self {
            Self::Signed(value) => value.to_string(),
            Self::Unsigned(value) => value.to_string(),
            Self::Text(value) => value.trim().to_string(),
        }
    }
}

/// Platform user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = LooseId::deserialize(deserializer)?.into_decimal();
        raw.parse()
            .map_err(|_| D::Error::custom(format!("invalid user id `{raw}`")))
    }
}

/// Server-assigned identifier, kept as its decimal text so 64-bit values
/// survive every hop without precision loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ServerId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for ServerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ServerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = LooseId::deserialize(deserializer)?.into_decimal();
        if raw.is_empty() {
            return Err(D::Error::custom("empty server id"));
        }
        Ok(Self(raw))
    }
}

/// Identity of a chat message.
///
/// Optimistic sends get a `Provisional` id (the local send time in
/// milliseconds) until the server echo replaces the entry; anything decoded
/// from the wire is `Server`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Provisional(i64),
    Server(ServerId),
}

impl MessageId {
    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    pub fn server_id(&self) -> Option<&ServerId> {
        match self {
            Self::Server(id) => Some(id),
            Self::Provisional(_) => None,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisional(stamp) => write!(f, "local-{stamp}"),
            Self::Server(id) => id.fmt(f),
        }
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Provisional(stamp) => serializer.serialize_i64(*stamp),
            Self::Server(id) => id.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ServerId::deserialize(deserializer).map(Self::Server)
    }
}

/// Chat payload kind (`TEXT`, `IMAGE`, ...). Unknown kinds are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Video,
    File,
    Other(String),
}

impl From<String> for MessageType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "" | "TEXT" => Self::Text,
            "IMAGE" => Self::Image,
            "VIDEO" => Self::Video,
            "FILE" => Self::File,
            _ => Self::Other(value),
        }
    }
}

impl From<MessageType> for String {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Text => "TEXT".to_string(),
            MessageType::Image => "IMAGE".to_string(),
            MessageType::Video => "VIDEO".to_string(),
            MessageType::File => "FILE".to_string(),
            MessageType::Other(other) => other,
        }
    }
}

/// A one-to-one chat message as the server reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub sender_username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sender_nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub sender_avatar: String,
    pub receiver_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable")]
    pub message_type: MessageType,
    #[serde(default, deserialize_with = "nullable")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub is_recalled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recalled_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
    /// Correlation token attached to an outbound send and echoed back by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_msg_id: Option<String>,
}

impl ChatMessage {
    pub fn sender_display_name(&self) -> &str {
        if !self.sender_nickname.is_empty() {
            &self.sender_nickname
        } else if !self.sender_username.is_empty() {
            &self.sender_username
        } else {
            "Unknown"
        }
    }
}

/// Conversation summary shown in the conversation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ServerId>,
    pub other_user_id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub other_user_username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub other_user_nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub other_user_avatar: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_online: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub last_message: String,
    #[serde(default, deserialize_with = "nullable")]
    pub last_message_type: MessageType,
    #[serde(default, deserialize_with = "nullable")]
    pub last_message_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub unread_count: u32,
}

impl Conversation {
    /// Local conversation for a peer the server has not listed yet. Display
    /// fields are taken from `sender` when the peer authored that message.
    pub fn for_peer(peer: UserId, sender: Option<&ChatMessage>) -> Self {
        let (username, nickname, avatar) = match sender {
            Some(message) if message.sender_id == peer => (
                message.sender_username.clone(),
                message.sender_nickname.clone(),
                message.sender_avatar.clone(),
            ),
            _ => Default::default(),
        };
        Self {
            conversation_id: None,
            other_user_id: peer,
            other_user_username: username,
            other_user_nickname: nickname,
            other_user_avatar: avatar,
            is_online: false,
            last_message: String::new(),
            last_message_type: MessageType::Text,
            last_message_time: String::new(),
            unread_count: 0,
        }
    }

    pub fn display_name(&self) -> String {
        if !self.other_user_nickname.is_empty() {
            self.other_user_nickname.clone()
        } else if !self.other_user_username.is_empty() {
            self.other_user_username.clone()
        } else {
            format!("user {}", self.other_user_id)
        }
    }
}

/// Pushed when a sender withdraws a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallNotice {
    pub message_id: ServerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recalled_at: Option<String>,
}

/// Pushed when a message is deleted server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNotice {
    pub message_id: ServerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
}

/// Signed-in user profile cached alongside the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    #[serde(default, deserialize_with = "nullable")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable")]
    pub nickname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}

/// Kind of platform notification. Unknown kinds are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    Follow,
    LikeVideo,
    FavoriteVideo,
    CommentVideo,
    ReplyComment,
    LikeComment,
    VideoApproved,
    VideoRejected,
    SystemAnnouncement,
    Unknown(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Follow => "FOLLOW",
            Self::LikeVideo => "LIKE_VIDEO",
            Self::FavoriteVideo => "FAVORITE_VIDEO",
            Self::CommentVideo => "COMMENT_VIDEO",
            Self::ReplyComment => "REPLY_COMMENT",
            Self::LikeComment => "LIKE_COMMENT",
            Self::VideoApproved => "VIDEO_APPROVED",
            Self::VideoRejected => "VIDEO_REJECTED",
            Self::SystemAnnouncement => "SYSTEM_ANNOUNCEMENT",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "FOLLOW" => Self::Follow,
            "LIKE_VIDEO" => Self::LikeVideo,
            "FAVORITE_VIDEO" => Self::FavoriteVideo,
            "COMMENT_VIDEO" => Self::CommentVideo,
            "REPLY_COMMENT" => Self::ReplyComment,
            "LIKE_COMMENT" => Self::LikeComment,
            "VIDEO_APPROVED" => Self::VideoApproved,
            "VIDEO_REJECTED" => Self::VideoRejected,
            "SYSTEM_ANNOUNCEMENT" => Self::SystemAnnouncement,
            _ => Self::Unknown(value),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Platform notification (follows, likes, comments, moderation results).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: ServerId,
    pub notification_type: NotificationKind,
    #[serde(default, deserialize_with = "nullable")]
    pub notification_type_desc: String,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub sender_username: Option<String>,
    #[serde(default)]
    pub sender_nickname: Option<String>,
    #[serde(default)]
    pub sender_avatar: Option<String>,
    #[serde(default)]
    pub related_video_id: Option<ServerId>,
    #[serde(default)]
    pub related_video_title: Option<String>,
    #[serde(default)]
    pub related_video_cover: Option<String>,
    #[serde(default)]
    pub related_comment_id: Option<ServerId>,
    #[serde(default)]
    pub related_comment_content: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub created_at: String,
    #[serde(default, deserialize_with = "nullable")]
    pub time_desc: String,
}

impl Notification {
    /// One-line summary used for in-app notices.
    pub fn summary(&self) -> String {
        let who = self
            .sender_nickname
            .as_deref()
            .or(self.sender_username.as_deref())
            .unwrap_or("ViewX");
        let what: &str = if self.notification_type_desc.is_empty() {
            self.notification_type.as_str()
        } else {
            &self.notification_type_desc
        };
        match self.content.as_deref() {
            Some(content) if !content.is_empty() => format!("{who} {what}: {content}"),
            _ => format!("{who} {what}"),
        }
    }
}
