use tokio::sync::mpsc;

use crate::common::{
    ChatMessage, DeleteNotice, Notification, RecallNotice, TransportEvent, UserId,
};

pub type Callback<T> = Box<dyn Fn(&T) + Send>;

/// Ordered callbacks for one event kind.
pub struct ListenerList<T> {
    callbacks: Vec<Callback<T>>,
}

impl<T> Default for ListenerList<T> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<T> ListenerList<T> {
    pub fn push(&mut self, callback: Callback<T>) {
        self.callbacks.push(callback);
    }

    pub fn emit(&self, value: &T) {
        for callback in &self.callbacks {
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn clear(&mut self) {
        self.callbacks.clear();
    }
}

/// A callback waiting to be registered with the transport worker.
pub enum Listener {
    Message(Callback<ChatMessage>),
    Typing(Callback<UserId>),
    Recall(Callback<RecallNotice>),
    Delete(Callback<DeleteNotice>),
    Notification(Callback<Notification>),
    Connect(Callback<()>),
    Error(Callback<String>),
}

impl Listener {
    /// One listener per event kind, each forwarding into `sender`.
    pub fn forward_all(sender: mpsc::UnboundedSender<TransportEvent>) -> Vec<Listener> {
        let forward = |event: TransportEvent, sender: &mpsc::UnboundedSender<TransportEvent>| {
            if sender.send(event).is_err() {
                log::debug!("Event receiver dropped");
            }
        };

        let tx = sender.clone();
        let on_message: Callback<ChatMessage> =
            Box::new(move |m: &ChatMessage| forward(TransportEvent::Message(m.clone()), &tx));
        let tx = sender.clone();
        let on_typing: Callback<UserId> =
            Box::new(move |id: &UserId| forward(TransportEvent::Typing(*id), &tx));
        let tx = sender.clone();
        let on_recall: Callback<RecallNotice> =
            Box::new(move |n: &RecallNotice| forward(TransportEvent::Recall(n.clone()), &tx));
        let tx = sender.clone();
        let on_delete: Callback<DeleteNotice> =
            Box::new(move |n: &DeleteNotice| forward(TransportEvent::Delete(n.clone()), &tx));
        let tx = sender.clone();
        let on_notification: Callback<Notification> =
            Box::new(move |n: &Notification| forward(TransportEvent::Notification(n.clone()), &tx));
        let tx = sender.clone();
        let on_connect: Callback<()> =
            Box::new(move |_: &()| forward(TransportEvent::Connected, &tx));
        let tx = sender;
        let on_error: Callback<String> =
            Box::new(move |message: &String| forward(TransportEvent::Error(message.clone()), &tx));

        vec![
            Listener::Message(on_message),
            Listener::Typing(on_typing),
            Listener::Recall(on_recall),
            Listener::Delete(on_delete),
            Listener::Notification(on_notification),
            Listener::Connect(on_connect),
            Listener::Error(on_error),
        ]
    }
}

/// Registry of listeners, owned by the transport worker.
#[derive(Default)]
pub struct Listeners {
    pub message: ListenerList<ChatMessage>,
    pub typing: ListenerList<UserId>,
    pub recall: ListenerList<RecallNotice>,
    pub delete: ListenerList<DeleteNotice>,
    pub notification: ListenerList<Notification>,
    pub connect: ListenerList<()>,
    pub error: ListenerList<String>,
}

impl Listeners {
    pub fn register(&mut self, listener: Listener) {
        match listener {
            Listener::Message(cb) => self.message.push(cb),
            Listener::Typing(cb) => self.typing.push(cb),
            Listener::Recall(cb) => self.recall.push(cb),
            Listener::Delete(cb) => self.delete.push(cb),
            Listener::Notification(cb) => self.notification.push(cb),
            Listener::Connect(cb) => self.connect.push(cb),
            Listener::Error(cb) => self.error.push(cb),
        }
    }

    pub fn dispatch(&self, event: &TransportEvent) {
        match event {
            TransportEvent::Connected => self.connect.emit(&()),
            TransportEvent::Message(message) => self.message.emit(message),
            TransportEvent::Typing(peer) => self.typing.emit(peer),
            TransportEvent::Recall(notice) => self.recall.emit(notice),
            TransportEvent::Delete(notice) => self.delete.emit(notice),
            TransportEvent::Notification(notification) => self.notification.emit(notification),
            TransportEvent::Error(message) => self.error.emit(message),
        }
    }

    pub fn clear(&mut self) {
        self.message.clear();
        self.typing.clear();
        self.recall.clear();
        self.delete.clear();
        self.notification.clear();
        self.connect.clear();
        self.error.clear();
    }

    pub fn total(&self) -> usize {
        self.message.len()
            + self.typing.len()
            + self.recall.len()
            + self.delete.len()
            + self.notification.len()
            + self.connect.len()
            + self.error.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn callbacks_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::default();
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            listeners.register(Listener::Typing(Box::new(move |peer: &UserId| {
                seen.lock().unwrap().push(format!("{tag}:{peer}"));
            })));
        }

        listeners.dispatch(&TransportEvent::Typing(UserId(7)));
        listeners.dispatch(&TransportEvent::Error("ignored".to_string()));

        assert_eq!(*seen.lock().unwrap(), vec!["first:7", "second:7"]);
    }

    #[test]
    fn forwarding_listeners_feed_the_event_bus() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut listeners = Listeners::default();
        for listener in Listener::forward_all(tx) {
            listeners.register(listener);
        }
        assert_eq!(listeners.total(), 7);

        listeners.dispatch(&TransportEvent::Connected);
        listeners.dispatch(&TransportEvent::Typing(UserId(3)));
        assert_eq!(rx.try_recv().unwrap(), TransportEvent::Connected);
        assert_eq!(rx.try_recv().unwrap(), TransportEvent::Typing(UserId(3)));

        listeners.clear();
        assert_eq!(listeners.total(), 0);
        assert!(listeners.message.is_empty());
    }
}
