use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::common::{
    Channel, ChatMessage, DeleteNotice, MessageType, Notification, Outbound, OutboundMessage,
    RecallNotice, TransportEvent, UserId,
};
use crate::notify::{NoticeLevel, Notifier};

use super::listeners::{Callback, Listener, Listeners};
use super::reconnect::{ConnectionState, ReconnectPolicy, ReconnectStep, ReconnectTracker};
use super::stomp::{Command as FrameCommand, Frame};
use super::transport::{Connector, Session};
use super::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub reconnect: ReconnectPolicy,
    pub heartbeat: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            reconnect: ReconnectPolicy::default(),
            heartbeat: Duration::from_millis(4000),
        }
    }
}

enum Command {
    Connect {
        credential: String,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Publish(Frame),
    Listen(Listener),
}

/// Handle to the real-time transport worker.
///
/// The worker task owns the broker session, the listener registry and the
/// reconnect bookkeeping. Handles are cheap to clone; the worker stops once
/// every handle is dropped.
#[derive(Clone)]
pub struct TransportClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
}

impl TransportClient {
    pub fn spawn(
        connector: Arc<dyn Connector>,
        options: TransportOptions,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let (state_sender, state_receiver) = watch::channel(ConnectionState::Disconnected);

        let worker = Worker {
            connector,
            notifier,
            listeners: Listeners::default(),
            tracker: ReconnectTracker::new(options.reconnect),
            heartbeat: options.heartbeat,
            state: state_sender,
            session: None,
            credential: None,
            retry_at: None,
        };
        tokio::spawn(worker.run(command_receiver));

        Self {
            commands: command_sender,
            state: state_receiver,
        }
    }

    /// Opens the broker session. Resolves once subscriptions are in place;
    /// a no-op when already connected.
    pub async fn connect(&self, credential: &str) -> Result<(), TransportError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Connect {
                credential: credential.to_string(),
                reply,
            })
            .map_err(|_| TransportError::Closed)?;
        response.await.map_err(|_| TransportError::Closed)?
    }

    /// Closes the session, cancels pending reconnects and drops every listener.
    pub async fn disconnect(&self) {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Disconnect { reply }).is_ok() {
            let _ = response.await;
        }
    }

    pub fn send(&self, outbound: Outbound) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let frame = Frame::send(outbound.destination(), outbound.body()?);
        self.commands
            .send(Command::Publish(frame))
            .map_err(|_| TransportError::Closed)
    }

    pub fn send_message(
        &self,
        receiver_id: UserId,
        content: &str,
        message_type: MessageType,
        client_msg_id: &str,
    ) -> Result<(), TransportError> {
        self.send(Outbound::Message(OutboundMessage {
            receiver_id,
            content: content.to_string(),
            message_type,
            client_msg_id: client_msg_id.to_string(),
        }))
    }

    pub fn send_typing(&self, receiver_id: UserId) -> Result<(), TransportError> {
        self.send(Outbound::Typing(receiver_id))
    }

    pub fn listen(&self, listener: Listener) {
        if self.commands.send(Command::Listen(listener)).is_err() {
            log::warn!("Transport worker stopped; listener not registered");
        }
    }

    pub fn on_message(&self, callback: impl Fn(&ChatMessage) + Send + 'static) {
        self.listen(Listener::Message(Box::new(callback)));
    }

    pub fn on_typing(&self, callback: impl Fn(&UserId) + Send + 'static) {
        self.listen(Listener::Typing(Box::new(callback)));
    }

    pub fn on_recall(&self, callback: impl Fn(&RecallNotice) + Send + 'static) {
        self.listen(Listener::Recall(Box::new(callback)));
    }

    pub fn on_delete(&self, callback: impl Fn(&DeleteNotice) + Send + 'static) {
        self.listen(Listener::Delete(Box::new(callback)));
    }

    pub fn on_notification(&self, callback: impl Fn(&Notification) + Send + 'static) {
        self.listen(Listener::Notification(Box::new(callback)));
    }

    pub fn on_connect(&self, callback: impl Fn() + Send + 'static) {
        let callback: Callback<()> = Box::new(move |_: &()| callback());
        self.listen(Listener::Connect(callback));
    }

    pub fn on_error(&self, callback: impl Fn(&str) + Send + 'static) {
        let callback: Callback<String> = Box::new(move |message: &String| callback(message));
        self.listen(Listener::Error(callback));
    }

    /// Registers forwarding listeners for every event kind and returns the
    /// receiving end. Events arrive in frame order.
    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<TransportEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        for listener in Listener::forward_all(sender) {
            self.listen(listener);
        }
        receiver
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}

struct Worker {
    connector: Arc<dyn Connector>,
    notifier: Arc<dyn Notifier>,
    listeners: Listeners,
    tracker: ReconnectTracker,
    heartbeat: Duration,
    state: watch::Sender<ConnectionState>,
    session: Option<Box<dyn Session>>,
    /// Credential of the last explicit connect; cleared by disconnect.
    credential: Option<String>,
    retry_at: Option<Instant>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let period = self.heartbeat.max(Duration::from_millis(100));
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::debug!("Transport worker started");
        loop {
            let alive = self.session.is_some();
            tokio::select! {
                command = commands.recv() => {
                    if let Some(command) = command {
                        self.handle_command(command).await;
                    } else {
                        break;
                    }
                }
                inbound = next_inbound(&mut self.session) => {
                    self.handle_inbound(inbound);
                }
                _ = wait_until(self.retry_at) => {
                    self.retry().await;
                }
                _ = heartbeat.tick(), if alive => {
                    self.send_heartbeat().await;
                }
            }
        }

        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        log::debug!("Transport worker stopped");
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            log::debug!("Connection state: {previous} -> {state}");
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { credential, reply } => {
                let result = self.connect(credential).await;
                let _ = reply.send(result);
            }
            Command::Disconnect { reply } => {
                self.disconnect().await;
                let _ = reply.send(());
            }
            Command::Publish(frame) => self.publish(frame).await,
            Command::Listen(listener) => self.listeners.register(listener),
        }
    }

    async fn connect(&mut self, credential: String) -> Result<(), TransportError> {
        if self.session.is_some() {
            return Ok(());
        }
        self.retry_at = None;
        self.set_state(ConnectionState::Connecting);

        match self.connector.connect(&credential).await {
            Ok(session) => match self.establish(session).await {
                Ok(()) => {
                    self.credential = Some(credential);
                    Ok(())
                }
                Err(err) => {
                    self.set_state(ConnectionState::Disconnected);
                    Err(err)
                }
            },
            Err(err) => {
                log::warn!("Real-time connection refused: {err}");
                self.set_state(ConnectionState::Disconnected);
                Err(err)
            }
        }
    }

    /// Subscribes every channel, acknowledges the session and announces it.
    async fn establish(&mut self, mut session: Box<dyn Session>) -> Result<(), TransportError> {
        let result: Result<(), TransportError> = async {
            for channel in Channel::ALL {
                session
                    .send(Frame::subscribe(channel.subscription_id(), channel.destination()))
                    .await?;
            }
            let ack = Outbound::ConnectAck;
            session
                .send(Frame::send(ack.destination(), ack.body()?))
                .await
        }
        .await;

        if let Err(err) = result {
            log::warn!("Failed to set up subscriptions: {err}");
            session.close().await;
            return Err(err);
        }

        self.session = Some(session);
        self.tracker.on_connected();
        self.set_state(ConnectionState::Connected);
        log::info!("Real-time connection established");
        self.listeners.dispatch(&TransportEvent::Connected);
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.retry_at = None;
        self.credential = None;
        if let Some(mut session) = self.session.take() {
            session.close().await;
            log::info!("Real-time connection closed");
        }
        self.tracker.on_connected();
        self.listeners.clear();
        self.set_state(ConnectionState::Disconnected);
    }

    async fn publish(&mut self, frame: Frame) {
        let Some(session) = self.session.as_mut() else {
            log::warn!("Dropping outbound frame: not connected");
            self.notifier
                .notify(NoticeLevel::Error, "Not connected, message was not sent");
            return;
        };
        if let Err(err) = session.send(frame).await {
            log::warn!("Publish failed: {err}");
            self.notifier
                .notify(NoticeLevel::Error, "Failed to send, please try again");
        }
    }

    async fn send_heartbeat(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(err) = session.heartbeat().await {
                log::warn!("Heart-beat failed: {err}");
            }
        }
    }

    fn handle_inbound(&mut self, inbound: Option<Result<Frame, TransportError>>) {
        match inbound {
            Some(Ok(frame)) => self.handle_frame(frame),
            Some(Err(TransportError::Frame(reason))) => {
                log::warn!("Dropping malformed frame: {reason}");
            }
            Some(Err(err)) => self.connection_lost(&err.to_string()),
            None => self.connection_lost("closed by the server"),
        }
    }

    fn handle_frame(&mut self, frame: Frame) {
        match frame.command {
            FrameCommand::Message => {
                let channel = frame
                    .get("subscription")
                    .and_then(Channel::from_subscription_id)
                    .or_else(|| frame.get("destination").and_then(Channel::from_destination));
                let Some(channel) = channel else {
                    log::warn!(
                        "Dropping message for unknown destination {:?}",
                        frame.get("destination")
                    );
                    return;
                };
                match TransportEvent::decode(channel, &frame.body) {
                    Ok(event) => self.listeners.dispatch(&event),
                    Err(err) => log::warn!("Dropping unparseable {channel:?} payload: {err}"),
                }
            }
            FrameCommand::Error => {
                let message = frame.error_message();
                log::warn!("Broker error: {message}");
                self.listeners.dispatch(&TransportEvent::Error(message));
            }
            other => log::debug!("<- {other}"),
        }
    }

    fn connection_lost(&mut self, reason: &str) {
        self.session = None;
        log::warn!("Real-time connection lost: {reason}");
        if self.credential.is_none() {
            self.set_state(ConnectionState::Disconnected);
            return;
        }
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        match self.tracker.next_step() {
            ReconnectStep::Retry { attempt, delay } => {
                log::info!("Reconnecting in {}ms (attempt {attempt})", delay.as_millis());
                self.retry_at = Some(Instant::now() + delay);
                self.set_state(ConnectionState::Reconnecting { attempt });
            }
            ReconnectStep::GiveUp { notify } => {
                self.retry_at = None;
                self.set_state(ConnectionState::Failed);
                if notify {
                    log::error!("Giving up after {} reconnect attempts", self.tracker.attempts());
                    self.notifier.notify(
                        NoticeLevel::Error,
                        "Chat connection lost. Restart the session to reconnect",
                    );
                }
            }
        }
    }

    async fn retry(&mut self) {
        self.retry_at = None;
        let Some(credential) = self.credential.clone() else {
            return;
        };
        self.set_state(ConnectionState::Connecting);
        let result = match self.connector.connect(&credential).await {
            Ok(session) => self.establish(session).await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            log::warn!("Reconnect attempt {} failed: {err}", self.tracker.attempts());
            self.schedule_retry();
        }
    }
}

async fn next_inbound(
    session: &mut Option<Box<dyn Session>>,
) -> Option<Result<Frame, TransportError>> {
    match session {
        Some(session) => session.next_frame().await,
        None => std::future::pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
