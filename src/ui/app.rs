use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::input::{self, HELP, Input};
use super::render;
use crate::common::TransportEvent;
use crate::error::ClientError;
use crate::session::{ClientSession, SessionSignal};

/// Interactive chat over stdin/stdout.
pub struct ChatApp {
    session: ClientSession,
}

enum Flow {
    Continue,
    Quit,
}

impl ChatApp {
    pub fn new(session: ClientSession) -> Self {
        Self { session }
    }

    pub async fn run(mut self) -> Result<(), ClientError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut state = self.session.transport().watch_state();

        println!("{HELP}");
        self.print_conversations();
        self.print_prompt();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if let Flow::Quit = self.handle_line(&line).await {
                        break;
                    }
                    self.print_prompt();
                }
                signal = self.session.next_event() => match signal {
                    Some(SessionSignal::Transport(event)) => {
                        self.session.handle_event(&event);
                        self.show_event(&event);
                    }
                    Some(SessionSignal::Unauthorized) => {
                        eprintln!("Session expired, run `viewx login` again");
                        break;
                    }
                    None => break,
                },
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.print_prompt();
                }
            }
        }

        self.session.shutdown().await;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        let input = match input::parse(line) {
            Ok(input) => input,
            Err(message) => {
                eprintln!("{message}");
                return Flow::Continue;
            }
        };

        let chat = self.session.chat_mut();
        match input {
            Input::Empty => {}
            Input::Quit => return Flow::Quit,
            Input::Help => println!("{HELP}"),
            Input::List => {
                if let Err(err) = chat.load_conversations().await {
                    log::warn!("Failed to refresh conversations: {err}");
                }
                self.print_conversations();
            }
            Input::Open(peer) => {
                chat.select_conversation(peer).await;
                self.print_messages();
            }
            Input::History(page) => match chat.current_peer() {
                Some(peer) => {
                    if let Err(err) = chat.load_chat_history(peer, page).await {
                        log::warn!("Failed to load history page {page}: {err}");
                    }
                    self.print_messages();
                }
                None => eprintln!("Open a conversation first"),
            },
            Input::Read => match chat.current_peer() {
                Some(peer) => {
                    if let Err(err) = chat.mark_as_read(peer).await {
                        log::warn!("Failed to mark conversation as read: {err}");
                    }
                }
                None => eprintln!("Open a conversation first"),
            },
            Input::Notifications => {
                let store = self.session.notifications_mut();
                if store.fetch_notifications(None).await.is_ok() {
                    for notification in store.notifications() {
                        println!("{}", render::notification_line(notification));
                    }
                    println!("{} unread", store.unread_count());
                }
            }
            Input::Typing => match chat.current_peer() {
                Some(peer) => chat.send_typing(peer),
                None => eprintln!("Open a conversation first"),
            },
            Input::Send(content) => match chat.current_peer() {
                Some(peer) => {
                    chat.send_typing(peer);
                    if chat.send_message(peer, &content) {
                        if let Some(message) = chat.current_messages().last() {
                            println!("{}", render::message_line(message));
                        }
                    }
                }
                None => eprintln!("Open a conversation first (/open <user id>)"),
            },
        }
        Flow::Continue
    }

    fn show_event(&self, event: &TransportEvent) {
        let chat = self.session.chat();
        match event {
            TransportEvent::Message(message) => {
                let open = chat.current_peer();
                if open == Some(message.sender_id) || open == Some(message.receiver_id) {
                    println!("{}", render::message_line(message));
                }
            }
            TransportEvent::Recall(_) | TransportEvent::Delete(_) => {
                if chat.current_peer().is_some() {
                    self.print_messages();
                }
            }
            TransportEvent::Typing(_) => self.print_prompt(),
            TransportEvent::Connected
            | TransportEvent::Notification(_)
            | TransportEvent::Error(_) => {}
        }
    }

    fn print_conversations(&self) {
        let chat = self.session.chat();
        if chat.conversations().is_empty() {
            println!("No conversations yet");
            return;
        }
        let open = chat.current_peer();
        for conversation in chat.conversations() {
            println!(
                "{}",
                render::conversation_line(conversation, open == Some(conversation.other_user_id))
            );
        }
        println!("{} unread", chat.total_unread_count());
    }

    fn print_messages(&self) {
        for message in self.session.chat().current_messages() {
            println!("{}", render::message_line(message));
        }
    }

    fn print_prompt(&self) {
        let chat = self.session.chat();
        let peer = chat.current_conversation().map(|c| c.display_name());
        print!(
            "{}",
            render::prompt(
                self.session.transport().state(),
                peer.as_deref(),
                chat.is_typing()
            )
        );
        if let Err(err) = std::io::stdout().flush() {
            log::debug!("stdout flush failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::common::commands::{SEND_DESTINATION, TYPING_DESTINATION};
    use crate::network::client::testing::FakeConnector;
    use crate::session::testing::session;

    async fn published(connector: &FakeConnector, count: usize) -> Vec<String> {
        let outbound = || {
            connector
                .sent()
                .iter()
                .filter_map(|frame| frame.get("destination"))
                .filter(|destination| [SEND_DESTINATION, TYPING_DESTINATION].contains(destination))
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let seen = outbound();
                if seen.len() >= count {
                    return seen;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| outbound())
    }

    #[tokio::test]
    async fn sending_a_line_signals_typing_first() {
        let connector = Arc::new(FakeConnector::default());
        let _frames = connector.push_session();
        let (session, _) = session(Arc::clone(&connector)).await;
        let mut app = ChatApp::new(session);

        app.handle_line("/open 42").await;
        app.handle_line("hello").await;

        assert_eq!(
            published(&connector, 2).await,
            vec![TYPING_DESTINATION.to_string(), SEND_DESTINATION.to_string()]
        );
    }

    #[tokio::test]
    async fn typing_command_needs_an_open_conversation() {
        let connector = Arc::new(FakeConnector::default());
        let _frames = connector.push_session();
        let (session, _) = session(Arc::clone(&connector)).await;
        let mut app = ChatApp::new(session);

        app.handle_line("/typing").await;
        app.handle_line("/open 42").await;
        app.handle_line("/typing").await;

        assert_eq!(
            published(&connector, 1).await,
            vec![TYPING_DESTINATION.to_string()]
        );
    }
}
