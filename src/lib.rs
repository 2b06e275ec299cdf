//! Client SDK and terminal client for the ViewX video platform: REST API
//! wrappers, the STOMP real-time channel and the chat and notification
//! stores that sit on top of them.

pub mod api;
pub mod common;
pub mod config;
pub mod error;
pub mod network;
pub mod notify;
pub mod session;
pub mod storage;
pub mod store;
pub mod ui;
pub mod version;

pub use error::ClientError;
pub use session::{ClientSession, SessionSignal};
