pub mod client;
pub mod listeners;
pub mod reconnect;
pub mod stomp;
pub mod transport;

pub use client::TransportClient;
pub use listeners::{Listener, Listeners};
pub use reconnect::{ConnectionState, ReconnectPolicy, ReconnectStep, ReconnectTracker};
pub use transport::{Connector, Session, WebSocketConnector};

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Broker refused the connection: {0}")]
    Refused(String),

    #[error("Timed out waiting for the broker")]
    Timeout,

    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed")]
    Closed,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Malformed frame: {0}")]
    Frame(String),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid WebSocket URL: {0}")]
    InvalidUrl(String),
}

impl From<stomp::FrameError> for TransportError {
    fn from(err: stomp::FrameError) -> Self {
        Self::Frame(err.to_string())
    }
}
