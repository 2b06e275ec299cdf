use crate::common::{ChatMessage, Conversation, Notification};
use crate::network::ConnectionState;
use crate::notify::{self, NoticeLevel, Notifier};
use crate::store::chat::RECALLED_PREVIEW;

/// Prints notices on stderr so they do not interleave with chat output.
pub struct TerminalNotifier {
    desktop: bool,
}

impl TerminalNotifier {
    pub fn new(desktop: bool) -> Self {
        Self { desktop }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let tag = match level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warn",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {message}");
    }

    fn desktop(&self, title: &str, body: &str) {
        if self.desktop {
            notify::show_desktop_notification(title, body);
        }
    }
}

pub fn conversation_line(conversation: &Conversation, open: bool) -> String {
    let marker = if open { '>' } else { ' ' };
    let unread = if conversation.unread_count > 0 {
        format!(" ({})", conversation.unread_count)
    } else {
        String::new()
    };
    format!(
        "{marker} {:>8}  {}{unread}  {}",
        conversation.other_user_id,
        conversation.display_name(),
        conversation.last_message
    )
}

pub fn message_line(message: &ChatMessage) -> String {
    let time = short_time(&message.created_at);
    let body: &str = if message.is_recalled {
        RECALLED_PREVIEW
    } else {
        &message.content
    };
    let pending = if message.id.is_provisional() { " …" } else { "" };
    format!(
        "[{time}] {}: {body}{pending}",
        message.sender_display_name()
    )
}

pub fn notification_line(notification: &Notification) -> String {
    let marker = if notification.is_read { ' ' } else { '*' };
    format!(
        "{marker} #{} {}  {}",
        notification.id,
        notification.summary(),
        notification.time_desc
    )
}

pub fn prompt(state: ConnectionState, peer: Option<&str>, typing: bool) -> String {
    let typing = if typing { " (typing…)" } else { "" };
    match peer {
        Some(peer) => format!("[{state}] {peer}{typing}> "),
        None => format!("[{state}]> "),
    }
}

/// `HH:MM` of an ISO timestamp, or the input when it has no time part.
fn short_time(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .and_then(|(_, time)| time.get(..5))
        .unwrap_or(timestamp)
}
