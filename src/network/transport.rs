use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::TransportError;
use super::stomp::{self, Command, Frame};

/// One live broker session.
#[async_trait]
pub trait Session: Send {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Next inbound frame; `None` once the peer has closed the session.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;

    async fn heartbeat(&mut self) -> Result<(), TransportError>;

    async fn close(&mut self);
}

/// Opens sessions. `credential` is the bearer token.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credential: &str) -> Result<Box<dyn Session>, TransportError>;
}

pub struct WebSocketConnector {
    url: Url,
    heartbeat_ms: u64,
    connect_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(
        url: &str,
        heartbeat_ms: u64,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let url = Url::parse(url).map_err(|err| TransportError::InvalidUrl(err.to_string()))?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme `{other}`"
                )));
            }
        }
        Ok(Self {
            url,
            heartbeat_ms,
            connect_timeout,
        })
    }

    async fn handshake(&self, credential: &str) -> Result<WebSocketSession, TransportError> {
        let (stream, response) = connect_async(self.url.as_str()).await?;
        log::debug!("WebSocket upgrade answered with {}", response.status());

        let mut session = WebSocketSession {
            stream,
            pending: VecDeque::new(),
        };
        let host = self.url.host_str().unwrap_or("localhost");
        let authorization = format!("Bearer {credential}");
        session
            .send(Frame::connect(host, &authorization, self.heartbeat_ms))
            .await?;

        loop {
            match session.next_frame().await {
                Some(Ok(frame)) => match frame.command {
                    Command::Connected => {
                        log::info!(
                            "STOMP session established (version {})",
                            frame.get("version").unwrap_or("?")
                        );
                        return Ok(session);
                    }
                    Command::Error => return Err(TransportError::Refused(frame.error_message())),
                    other => log::debug!("Ignoring {other} frame before CONNECTED"),
                },
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(TransportError::Handshake(
                        "socket closed before CONNECTED".to_string(),
                    ));
                }
            }
        }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, credential: &str) -> Result<Box<dyn Session>, TransportError> {
        let session = timeout(self.connect_timeout, self.handshake(credential))
            .await
            .map_err(|_| TransportError::Timeout)??;
        Ok(Box::new(session))
    }
}

pub struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pending: VecDeque<Frame>,
}

#[async_trait]
impl Session for WebSocketSession {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        log::debug!("-> {}", frame.command);
        self.stream.send(Message::Text(frame.encode())).await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(Ok(frame));
            }
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(err) => return Some(Err(err.into())),
            };
            let text = match message {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(err) => return Some(Err(TransportError::Frame(err.to_string()))),
                },
                Message::Close(_) => return None,
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
            match stomp::decode(&text) {
                Ok(frames) => self.pending.extend(frames),
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    async fn heartbeat(&mut self) -> Result<(), TransportError> {
        self.stream.send(Message::Text("\n".to_string())).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(err) = self.send(Frame::disconnect()).await {
            log::debug!("DISCONNECT not delivered: {err}");
        }
        if let Err(err) = self.stream.close(None).await {
            log::debug!("WebSocket close failed: {err}");
        }
    }
}
