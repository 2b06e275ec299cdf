//! Lifecycle of a signed-in client: everything that lives between login and
//! logout is built here and torn down here.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::api::auth::AuthApi;
use crate::api::chat::ChatApi;
use crate::api::notification::NotificationApi;
use crate::api::ApiClient;
use crate::common::{TransportEvent, UserInfo};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::network::{Connector, TransportClient, WebSocketConnector};
use crate::notify::{NoticeLevel, Notifier};
use crate::storage::KvStore;
use crate::store::{
    ChatHistorySource, ChatOptions, ChatStore, ChatTransport, NotificationSource,
    NotificationStore, SessionStore,
};

/// Something the session driver should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionSignal {
    Transport(TransportEvent),
    /// The server rejected the stored credential; the token is already gone.
    Unauthorized,
}

pub struct ClientSession {
    config: ClientConfig,
    api: ApiClient,
    transport: TransportClient,
    chat: ChatStore,
    notifications: NotificationStore,
    notifier: Arc<dyn Notifier>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    unauthorized: broadcast::Receiver<()>,
}

impl ClientSession {
    /// Builds the clients and stores for the stored credential and connects
    /// the real-time channel. A broker failure is not fatal: REST keeps
    /// working and the session reports itself offline.
    pub async fn start(
        config: ClientConfig,
        kv: Arc<KvStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let session = SessionStore::new(kv);
        let token = session.token().ok_or(ClientError::NotLoggedIn)?;
        let api = ApiClient::new(
            &config.api_base_url,
            config.request_timeout(),
            session.clone(),
            Arc::clone(&notifier),
        )?;

        let me = current_user(&api, &session).await?;
        log::info!("Starting session for {} ({})", me.display_name(), me.id);

        let connector = WebSocketConnector::new(
            &config.websocket_url(),
            config.heartbeat_ms,
            config.request_timeout(),
        )?;
        let transport = TransportClient::spawn(
            Arc::new(connector) as Arc<dyn Connector>,
            config.transport_options(),
            Arc::clone(&notifier),
        );

        Self::assemble(config, api, transport, me, notifier, &token).await
    }

    /// Wires already-built clients together. Split from [`Self::start`] so
    /// tests can pass a fake broker.
    pub(crate) async fn assemble(
        config: ClientConfig,
        api: ApiClient,
        transport: TransportClient,
        me: UserInfo,
        notifier: Arc<dyn Notifier>,
        token: &str,
    ) -> Result<Self, ClientError> {
        let events = transport.subscribe_events();
        let unauthorized = api.subscribe_unauthorized();

        let chat = ChatStore::new(
            me,
            Arc::new(ChatApi::new(api.clone())) as Arc<dyn ChatHistorySource>,
            Arc::new(transport.clone()) as Arc<dyn ChatTransport>,
            Arc::clone(&notifier),
            ChatOptions {
                typing_window: config.typing_window(),
                history_page_size: config.history_page_size,
                desktop_notifications: config.desktop_notifications,
            },
        );
        let notifications = NotificationStore::new(
            Arc::new(NotificationApi::new(api.clone())) as Arc<dyn NotificationSource>,
        );

        if let Err(err) = transport.connect(token).await {
            log::warn!("Real-time channel unavailable: {err}");
            notifier.notify(
                NoticeLevel::Warning,
                "Chat service unavailable, messages will not arrive in real time",
            );
        }

        let mut client = Self {
            config,
            api,
            transport,
            chat,
            notifications,
            notifier,
            events,
            unauthorized,
        };
        if let Err(err) = client.chat.load_conversations().await {
            log::warn!("Failed to load conversations: {err}");
        }
        client.notifications.fetch_unread_count().await;
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    pub fn chat(&self) -> &ChatStore {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatStore {
        &mut self.chat
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationStore {
        &mut self.notifications
    }

    /// Next event, in arrival order. `None` once the transport is gone.
    pub async fn next_event(&mut self) -> Option<SessionSignal> {
        tokio::select! {
            event = self.events.recv() => event.map(SessionSignal::Transport),
            signal = self.unauthorized.recv() => match signal {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    Some(SessionSignal::Unauthorized)
                }
                Err(broadcast::error::RecvError::Closed) => None,
            },
        }
    }

    /// Routes one transport event to the store that owns it.
    pub fn handle_event(&mut self, event: &TransportEvent) {
        match event {
            TransportEvent::Notification(notification) => {
                self.notifier
                    .notify(NoticeLevel::Info, &notification.summary());
                self.notifications.add_notification(notification.clone());
            }
            TransportEvent::Error(message) => {
                self.notifier.notify(NoticeLevel::Error, message);
            }
            other => self.chat.apply_event(other),
        }
    }

    /// Closes the real-time channel; registered listeners are dropped with it.
    pub async fn shutdown(&mut self) {
        self.transport.disconnect().await;
        log::info!("Session closed");
    }

    /// Server-side logout (failures ignored), then local credential removal.
    pub async fn logout(mut self) -> Result<(), ClientError> {
        if let Err(err) = AuthApi::new(self.api.clone()).logout().await {
            log::debug!("Server logout failed: {err}");
        }
        self.api.session().logout()?;
        self.shutdown().await;
        Ok(())
    }
}

/// Cached profile, or a fresh one from the server that is then cached.
async fn current_user(api: &ApiClient, session: &SessionStore) -> Result<UserInfo, ClientError> {
    if let Some(info) = session.user_info() {
        return Ok(info);
    }
    let info = AuthApi::new(api.clone()).me().await?;
    session.set_user_info(&info)?;
    Ok(info)
}
