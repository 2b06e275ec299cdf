//! Chat session state: conversations, per-peer message lists and typing
//! indicators, reconciled against real-time echoes from the server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::api::ApiError;
use crate::common::{
    ChatMessage, Conversation, DeleteNotice, MessageId, MessageType, RecallNotice, ServerId,
    TransportEvent, UserId, UserInfo,
};
use crate::network::{TransportClient, TransportError};
use crate::notify::{NoticeLevel, Notifier};

pub const RECALLED_PREVIEW: &str = "[message recalled]";

/// REST side of the chat store.
#[async_trait]
pub trait ChatHistorySource: Send + Sync {
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// One page of history, newest first.
    async fn history(&self, peer: UserId, page: u32, size: u32)
        -> Result<Vec<ChatMessage>, ApiError>;

    async fn mark_as_read(&self, peer: UserId) -> Result<(), ApiError>;
}

/// Real-time side of the chat store.
pub trait ChatTransport: Send + Sync {
    fn is_connected(&self) -> bool;

    fn send_message(
        &self,
        receiver: UserId,
        content: &str,
        message_type: MessageType,
        client_msg_id: &str,
    ) -> Result<(), TransportError>;

    fn send_typing(&self, receiver: UserId) -> Result<(), TransportError>;
}

impl ChatTransport for TransportClient {
    fn is_connected(&self) -> bool {
        TransportClient::is_connected(self)
    }

    fn send_message(
        &self,
        receiver: UserId,
        content: &str,
        message_type: MessageType,
        client_msg_id: &str,
    ) -> Result<(), TransportError> {
        TransportClient::send_message(self, receiver, content, message_type, client_msg_id)
    }

    fn send_typing(&self, receiver: UserId) -> Result<(), TransportError> {
        TransportClient::send_typing(self, receiver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatOptions {
    pub typing_window: Duration,
    pub history_page_size: u32,
    pub desktop_notifications: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            typing_window: Duration::from_millis(3000),
            history_page_size: 50,
            desktop_notifications: false,
        }
    }
}

/// What `handle_new_message` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Appended,
    /// An optimistic entry was swapped for the server's copy.
    Replaced,
    Duplicate,
}

pub struct ChatStore {
    me: UserInfo,
    history: Arc<dyn ChatHistorySource>,
    transport: Arc<dyn ChatTransport>,
    notifier: Arc<dyn Notifier>,
    options: ChatOptions,
    conversations: Vec<Conversation>,
    current: Option<UserId>,
    messages: HashMap<UserId, Vec<ChatMessage>>,
    /// Peer -> moment its typing indicator lapses.
    typing: HashMap<UserId, Instant>,
    loading: bool,
}

impl ChatStore {
    pub fn new(
        me: UserInfo,
        history: Arc<dyn ChatHistorySource>,
        transport: Arc<dyn ChatTransport>,
        notifier: Arc<dyn Notifier>,
        options: ChatOptions,
    ) -> Self {
        Self {
            me,
            history,
            transport,
            notifier,
            options,
            conversations: Vec::new(),
            current: None,
            messages: HashMap::new(),
            typing: HashMap::new(),
            loading: false,
        }
    }

    pub fn me(&self) -> &UserInfo {
        &self.me
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, peer: UserId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.other_user_id == peer)
    }

    pub fn current_peer(&self) -> Option<UserId> {
        self.current
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        self.current.and_then(|peer| self.conversation(peer))
    }

    pub fn messages_for(&self, peer: UserId) -> &[ChatMessage] {
        self.messages.get(&peer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn current_messages(&self) -> &[ChatMessage] {
        match self.current {
            Some(peer) => self.messages_for(peer),
            None => &[],
        }
    }

    pub fn total_unread_count(&self) -> u32 {
        self.conversations
            .iter()
            .map(|conversation| conversation.unread_count)
            .sum()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn clear_current_conversation(&mut self) {
        self.current = None;
    }

    /// Sends `content` to `peer` and shows it immediately as a provisional
    /// entry. Returns false, leaving state untouched, when nothing was sent.
    pub fn send_message(&mut self, peer: UserId, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() {
            self.notifier
                .notify(NoticeLevel::Warning, "Message content cannot be empty");
            return false;
        }
        if !self.transport.is_connected() {
            self.notifier.notify(
                NoticeLevel::Warning,
                "Chat service is not connected, please try again later",
            );
            return false;
        }

        let client_msg_id = Uuid::new_v4().to_string();
        if let Err(err) =
            self.transport
                .send_message(peer, content, MessageType::Text, &client_msg_id)
        {
            log::warn!("Failed to send chat message to {peer}: {err}");
            self.notifier
                .notify(NoticeLevel::Error, "Failed to send message");
            return false;
        }

        let now = Utc::now();
        let sender_nickname = if self.me.nickname.is_empty() {
            self.me.username.clone()
        } else {
            self.me.nickname.clone()
        };
        let provisional = ChatMessage {
            id: MessageId::Provisional(now.timestamp_millis()),
            sender_id: self.me.id,
            sender_username: self.me.username.clone(),
            sender_nickname,
            sender_avatar: self.me.avatar.clone(),
            receiver_id: peer,
            content: content.to_string(),
            message_type: MessageType::Text,
            is_read: false,
            is_recalled: false,
            recalled_at: None,
            created_at: now.to_rfc3339(),
            client_msg_id: Some(client_msg_id),
        };
        self.handle_new_message(provisional);
        true
    }

    /// Merges a message into the peer's list.
    ///
    /// A server copy of one of my own sends replaces its provisional entry:
    /// matched by correlation token when the echo carries one, otherwise by
    /// content and sender against provisional entries only.
    pub fn handle_new_message(&mut self, message: ChatMessage) -> Reconciliation {
        let mine = message.sender_id == self.me.id;
        let peer = if mine {
            message.receiver_id
        } else {
            message.sender_id
        };

        let list = self.messages.entry(peer).or_default();
        let outcome = if contains_server_id(list, message.id.server_id()) {
            Reconciliation::Duplicate
        } else if mine && !message.id.is_provisional() {
            match find_provisional(list, &message) {
                Some(index) => {
                    list[index] = message.clone();
                    Reconciliation::Replaced
                }
                None => {
                    list.push(message.clone());
                    Reconciliation::Appended
                }
            }
        } else {
            list.push(message.clone());
            Reconciliation::Appended
        };

        if outcome == Reconciliation::Duplicate {
            log::debug!("Ignoring duplicate message {}", message.id);
            return outcome;
        }

        let open = self.current == Some(peer);
        let addressed_to_me = message.receiver_id == self.me.id;
        let conversation = self.touch_conversation(peer, &message);
        if addressed_to_me && !open {
            conversation.unread_count += 1;
        }

        if !mine && !open {
            let sender = message.sender_display_name();
            self.notifier.notify(
                NoticeLevel::Info,
                &format!("{sender}: {}", message.content),
            );
            if self.options.desktop_notifications {
                self.notifier.desktop(sender, &message.content);
            }
        }
        outcome
    }

    /// Marks a message recalled; its content is kept. Returns false when
    /// the message is not cached.
    pub fn handle_recall_notification(&mut self, notice: &RecallNotice) -> bool {
        let recalled_at = notice
            .recalled_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        let Some((peer, index, was_latest)) = self.locate(&notice.message_id) else {
            log::debug!("Recall for unknown message {}", notice.message_id);
            return false;
        };
        if let Some(entry) = self
            .messages
            .get_mut(&peer)
            .and_then(|list| list.get_mut(index))
        {
            entry.is_recalled = true;
            entry.recalled_at = Some(recalled_at);
        }
        if was_latest {
            self.refresh_preview(peer);
        }
        true
    }

    /// Removes a message. Returns false when the message is not cached.
    pub fn handle_delete_notification(&mut self, notice: &DeleteNotice) -> bool {
        let Some((peer, index, was_latest)) = self.locate(&notice.message_id) else {
            log::debug!("Delete for unknown message {}", notice.message_id);
            return false;
        };
        if let Some(list) = self.messages.get_mut(&peer) {
            list.remove(index);
        }
        if was_latest {
            self.refresh_preview(peer);
        }
        true
    }

    pub fn handle_typing(&mut self, peer: UserId) {
        let now = Instant::now();
        self.typing.retain(|_, until| *until > now);
        self.typing.insert(peer, now + self.options.typing_window);
    }

    /// Whether the peer of the open conversation is typing.
    pub fn is_typing(&self) -> bool {
        self.current
            .is_some_and(|peer| self.is_peer_typing(peer))
    }

    pub fn is_peer_typing(&self, peer: UserId) -> bool {
        self.typing
            .get(&peer)
            .is_some_and(|until| *until > Instant::now())
    }

    /// Opens the conversation with `peer`, loading its first history page
    /// when nothing is cached. Unread is cleared locally before the server
    /// is told, and stays cleared if that call fails.
    pub async fn select_conversation(&mut self, peer: UserId) {
        self.current = Some(peer);
        if self.conversation(peer).is_none() {
            self.conversations.insert(0, Conversation::for_peer(peer, None));
        }

        if !self.messages.contains_key(&peer) {
            if let Err(err) = self.load_chat_history(peer, 1).await {
                log::warn!("Failed to load history with {peer}: {err}");
            }
        }

        let had_unread = match self.conversation_mut(peer) {
            Some(conversation) if conversation.unread_count > 0 => {
                conversation.unread_count = 0;
                true
            }
            _ => false,
        };
        if had_unread {
            if let Err(err) = self.history.mark_as_read(peer).await {
                log::warn!("Failed to mark conversation with {peer} as read: {err}");
            }
        }
    }

    /// Replaces the cached list for `peer` with one page, oldest first.
    pub async fn load_chat_history(&mut self, peer: UserId, page: u32) -> Result<usize, ApiError> {
        self.loading = true;
        let result = self
            .history
            .history(peer, page, self.options.history_page_size)
            .await;
        self.loading = false;

        let mut page = result?;
        page.reverse();
        let count = page.len();
        self.messages.insert(peer, page);
        Ok(count)
    }

    pub async fn load_conversations(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let result = self.history.conversations().await;
        self.loading = false;

        self.conversations = result?;
        log::debug!("Loaded {} conversations", self.conversations.len());
        Ok(())
    }

    pub async fn mark_as_read(&mut self, peer: UserId) -> Result<(), ApiError> {
        self.history.mark_as_read(peer).await?;
        if let Some(conversation) = self.conversation_mut(peer) {
            conversation.unread_count = 0;
        }
        Ok(())
    }

    pub fn send_typing(&self, peer: UserId) {
        if !self.transport.is_connected() {
            return;
        }
        if let Err(err) = self.transport.send_typing(peer) {
            log::debug!("Typing signal to {peer} not sent: {err}");
        }
    }

    /// Applies one real-time event. Notifications and errors are not chat
    /// state and are ignored here.
    pub fn apply_event(&mut self, event: &TransportEvent) {
        match event {
            TransportEvent::Message(message) => {
                self.handle_new_message(message.clone());
            }
            TransportEvent::Typing(peer) => self.handle_typing(*peer),
            TransportEvent::Recall(notice) => {
                self.handle_recall_notification(notice);
            }
            TransportEvent::Delete(notice) => {
                self.handle_delete_notification(notice);
            }
            TransportEvent::Connected => log::debug!("Chat transport connected"),
            TransportEvent::Notification(_) | TransportEvent::Error(_) => {}
        }
    }

    fn conversation_mut(&mut self, peer: UserId) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|conversation| conversation.other_user_id == peer)
    }

    /// Updates the preview for `message` and moves the conversation to the
    /// head of the list, creating it when absent.
    fn touch_conversation(&mut self, peer: UserId, message: &ChatMessage) -> &mut Conversation {
        let mut conversation = match self
            .conversations
            .iter()
            .position(|conversation| conversation.other_user_id == peer)
        {
            Some(index) => self.conversations.remove(index),
            None => Conversation::for_peer(peer, Some(message)),
        };
        conversation.last_message = preview_of(message);
        conversation.last_message_type = message.message_type.clone();
        conversation.last_message_time = message.created_at.clone();
        self.conversations.insert(0, conversation);
        &mut self.conversations[0]
    }

    fn refresh_preview(&mut self, peer: UserId) {
        let latest = self
            .messages
            .get(&peer)
            .and_then(|list| list.last())
            .map(|message| {
                (
                    preview_of(message),
                    message.message_type.clone(),
                    message.created_at.clone(),
                )
            });
        if let Some(conversation) = self.conversation_mut(peer) {
            match latest {
                Some((preview, message_type, time)) => {
                    conversation.last_message = preview;
                    conversation.last_message_type = message_type;
                    conversation.last_message_time = time;
                }
                None => conversation.last_message.clear(),
            }
        }
    }

    /// Peer, index and whether the entry is the newest in its list.
    fn locate(&self, id: &ServerId) -> Option<(UserId, usize, bool)> {
        self.messages.iter().find_map(|(peer, list)| {
            list.iter()
                .position(|message| message.id.server_id() == Some(id))
                .map(|index| (*peer, index, index + 1 == list.len()))
        })
    }
}

fn preview_of(message: &ChatMessage) -> String {
    if message.is_recalled {
        RECALLED_PREVIEW.to_string()
    } else {
        message.content.clone()
    }
}

fn contains_server_id(list: &[ChatMessage], id: Option<&ServerId>) -> bool {
    id.is_some_and(|id| list.iter().any(|message| message.id.server_id() == Some(id)))
}

fn find_provisional(list: &[ChatMessage], echo: &ChatMessage) -> Option<usize> {
    match echo.client_msg_id.as_deref() {
        Some(token) => list.iter().position(|message| {
            message.id.is_provisional() && message.client_msg_id.as_deref() == Some(token)
        }),
        None => list.iter().rposition(|message| {
            message.id.is_provisional()
                && message.sender_id == echo.sender_id
                && message.content == echo.content
        }),
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::{FakeHistory, FakeTransport};
    use super::*;
    use crate::notify::testing::RecordingNotifier;

    const ME: UserId = UserId(1);
    const PEER: UserId = UserId(42);

    struct Harness {
        store: ChatStore,
        history: Arc<FakeHistory>,
        transport: Arc<FakeTransport>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(transport: FakeTransport, options: ChatOptions) -> Harness {
        let history = Arc::new(FakeHistory::default());
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let me = UserInfo {
            id: ME,
            username: "me".to_string(),
            nickname: String::new(),
            avatar: String::new(),
            email: None,
        };
        let store = ChatStore::new(
            me,
            Arc::clone(&history) as Arc<dyn ChatHistorySource>,
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            options,
        );
        Harness {
            store,
            history,
            transport,
            notifier,
        }
    }

    fn message(id: MessageId, sender: UserId, receiver: UserId, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            sender_id: sender,
            sender_username: format!("user{sender}"),
            sender_nickname: String::new(),
            sender_avatar: String::new(),
            receiver_id: receiver,
            content: content.to_string(),
            message_type: MessageType::Text,
            is_read: false,
            is_recalled: false,
            recalled_at: None,
            created_at: "2025-01-01T10:00:00".to_string(),
            client_msg_id: None,
        }
    }

    fn server(id: &str) -> MessageId {
        MessageId::Server(ServerId::new(id))
    }

    #[test]
    fn sending_while_disconnected_changes_nothing() {
        let mut h = harness(FakeTransport::default(), ChatOptions::default());

        assert!(!h.store.send_message(PEER, "hi"));
        assert!(!h.store.send_message(PEER, "   "));

        assert!(h.store.messages_for(PEER).is_empty());
        assert!(h.store.conversations().is_empty());
        assert_eq!(h.notifier.count(NoticeLevel::Warning), 2);
        assert!(h.transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_transport_send_is_reported_without_mutation() {
        let transport = FakeTransport::connected();
        transport.fail_sends.store(true, Ordering::SeqCst);
        let mut h = harness(transport, ChatOptions::default());

        assert!(!h.store.send_message(PEER, "hi"));
        assert!(h.store.messages_for(PEER).is_empty());
        assert_eq!(h.notifier.count(NoticeLevel::Error), 1);
    }

    #[test]
    fn echo_with_token_replaces_the_provisional_entry() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());

        assert!(h.store.send_message(PEER, "  hi  "));
        let provisional = &h.store.messages_for(PEER)[0];
        assert!(provisional.id.is_provisional());
        assert_eq!(provisional.content, "hi");
        assert_eq!(h.store.conversations()[0].other_user_id, PEER);

        let mut echo = message(server("7123456789012345678"), ME, PEER, "hi");
        echo.client_msg_id = Some(h.transport.last_token());
        assert_eq!(h.store.handle_new_message(echo), Reconciliation::Replaced);

        let list = h.store.messages_for(PEER);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list[0].id.server_id().map(ServerId::as_str),
            Some("7123456789012345678")
        );
        assert!(h.notifier.messages().is_empty());
    }

    #[test]
    fn echo_without_token_matches_by_content_and_sender() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.store.handle_new_message(message(
            MessageId::Provisional(1_700_000_000_000),
            ME,
            PEER,
            "hi",
        ));

        let outcome = h.store.handle_new_message(message(
            server("7123456789012345678"),
            ME,
            PEER,
            "hi",
        ));

        assert_eq!(outcome, Reconciliation::Replaced);
        let list = h.store.messages_for(PEER);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, server("7123456789012345678"));
    }

    #[test]
    fn echo_never_replaces_persisted_entries() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.store
            .handle_new_message(message(server("100"), ME, PEER, "hi"));

        let outcome = h
            .store
            .handle_new_message(message(server("101"), ME, PEER, "hi"));

        assert_eq!(outcome, Reconciliation::Appended);
        assert_eq!(h.store.messages_for(PEER).len(), 2);
    }

    #[test]
    fn redelivered_messages_are_ignored() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        let inbound = message(server("55"), PEER, ME, "hello");

        assert_eq!(
            h.store.handle_new_message(inbound.clone()),
            Reconciliation::Appended
        );
        assert_eq!(
            h.store.handle_new_message(inbound),
            Reconciliation::Duplicate
        );

        assert_eq!(h.store.messages_for(PEER).len(), 1);
        assert_eq!(h.store.total_unread_count(), 1);
        assert_eq!(h.notifier.count(NoticeLevel::Info), 1);
    }

    #[test]
    fn inbound_messages_count_unread_and_notify_when_closed() {
        let options = ChatOptions {
            desktop_notifications: true,
            ..ChatOptions::default()
        };
        let mut h = harness(FakeTransport::connected(), options);
        let mut inbound = message(server("1"), PEER, ME, "hey");
        inbound.sender_nickname = "Bob".to_string();

        h.store.handle_new_message(inbound);

        let conversation = h.store.conversation(PEER).unwrap();
        assert_eq!(conversation.unread_count, 1);
        assert_eq!(conversation.other_user_nickname, "Bob");
        assert_eq!(conversation.last_message, "hey");
        assert_eq!(h.notifier.messages(), vec!["Bob: hey".to_string()]);
        assert_eq!(h.notifier.desktop_count(), 1);
    }

    #[tokio::test]
    async fn open_conversation_does_not_count_unread() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.store.select_conversation(PEER).await;

        h.store
            .handle_new_message(message(server("1"), PEER, ME, "hey"));

        assert_eq!(h.store.total_unread_count(), 0);
        assert!(h.notifier.messages().is_empty());
        assert_eq!(h.store.current_messages().len(), 1);
    }

    #[test]
    fn updated_conversations_move_to_the_head() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.store
            .handle_new_message(message(server("1"), UserId(7), ME, "first"));
        h.store
            .handle_new_message(message(server("2"), PEER, ME, "second"));
        h.store
            .handle_new_message(message(server("3"), UserId(7), ME, "third"));

        let order: Vec<_> = h
            .store
            .conversations()
            .iter()
            .map(|conversation| conversation.other_user_id)
            .collect();
        assert_eq!(order, vec![UserId(7), PEER]);
        assert_eq!(h.store.total_unread_count(), 3);
    }

    #[tokio::test]
    async fn selecting_clears_unread_even_when_the_server_call_fails() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.history.fail_mark_read.store(true, Ordering::SeqCst);
        h.store
            .handle_new_message(message(server("1"), PEER, ME, "a"));
        h.store
            .handle_new_message(message(server("2"), PEER, ME, "b"));
        assert_eq!(h.store.total_unread_count(), 2);

        h.store.select_conversation(PEER).await;

        assert_eq!(h.store.conversation(PEER).unwrap().unread_count, 0);
        assert_eq!(*h.history.mark_read_calls.lock().unwrap(), vec![PEER]);
        assert!(h.history.history_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_loaded_once_and_reversed() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.history.pages.lock().unwrap().insert(
            PEER,
            vec![
                message(server("3"), PEER, ME, "newest"),
                message(server("2"), ME, PEER, "middle"),
                message(server("1"), PEER, ME, "oldest"),
            ],
        );

        h.store.select_conversation(PEER).await;
        h.store.clear_current_conversation();
        h.store.select_conversation(PEER).await;

        let contents: Vec<_> = h
            .store
            .messages_for(PEER)
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["oldest", "middle", "newest"]);
        assert_eq!(*h.history.history_calls.lock().unwrap(), vec![(PEER, 1, 50)]);
        assert!(!h.store.is_loading());
    }

    #[test]
    fn recall_keeps_the_entry_and_delete_removes_it() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.store
            .handle_new_message(message(server("1"), PEER, ME, "keep me"));
        h.store
            .handle_new_message(message(server("2"), PEER, ME, "take back"));

        assert!(h.store.handle_recall_notification(&RecallNotice {
            message_id: ServerId::new("2"),
            sender_id: Some(PEER),
            receiver_id: Some(ME),
            recalled_at: Some("2025-01-01T10:05:00".to_string()),
        }));
        let recalled = &h.store.messages_for(PEER)[1];
        assert!(recalled.is_recalled);
        assert_eq!(recalled.content, "take back");
        assert_eq!(recalled.recalled_at.as_deref(), Some("2025-01-01T10:05:00"));
        assert_eq!(
            h.store.conversation(PEER).unwrap().last_message,
            RECALLED_PREVIEW
        );

        assert!(h.store.handle_delete_notification(&DeleteNotice {
            message_id: ServerId::new("2"),
            sender_id: None,
            receiver_id: None,
        }));
        assert_eq!(h.store.messages_for(PEER).len(), 1);
        assert_eq!(h.store.conversation(PEER).unwrap().last_message, "keep me");

        assert!(!h.store.handle_delete_notification(&DeleteNotice {
            message_id: ServerId::new("404"),
            sender_id: None,
            receiver_id: None,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn typing_indicator_lapses_after_the_window() {
        let mut h = harness(FakeTransport::connected(), ChatOptions::default());
        h.store.select_conversation(PEER).await;

        h.store.apply_event(&TransportEvent::Typing(PEER));
        assert!(h.store.is_typing());

        tokio::time::advance(Duration::from_millis(2500)).await;
        h.store.handle_typing(PEER);
        tokio::time::advance(Duration::from_millis(2500)).await;
        assert!(h.store.is_typing());

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!h.store.is_typing());
    }

    #[test]
    fn typing_signals_need_a_connection() {
        let h = harness(FakeTransport::default(), ChatOptions::default());
        h.store.send_typing(PEER);
        assert!(h.transport.typing.lock().unwrap().is_empty());

        h.transport.connected.store(true, Ordering::SeqCst);
        h.store.send_typing(PEER);
        assert_eq!(*h.transport.typing.lock().unwrap(), vec![PEER]);
    }
}
