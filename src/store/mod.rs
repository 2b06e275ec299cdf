//! Client-side state owned by a signed-in session.

pub mod chat;
pub mod notification;
pub mod preferences;
pub mod session;

pub use chat::{ChatHistorySource, ChatOptions, ChatStore, ChatTransport, Reconciliation};
pub use notification::{NotificationSource, NotificationStore};
pub use preferences::{PlayerPreferences, ViewMode};
pub use session::SessionStore;
