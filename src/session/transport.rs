//! Transport seam between the session state machine and the network.

use crate::model::{ClientId, TransportError};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::trace;

/// Where to connect and who to connect as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    /// Base endpoint, e.g. `ws://localhost:8000/ws`.
    pub endpoint: String,
    /// Identifier announced to the server.
    pub client_id: ClientId,
}

impl ConnectTarget {
    /// Create a target.
    pub fn new(endpoint: impl Into<String>, client_id: ClientId) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_id,
        }
    }

    /// Full URL with the `clientId` query parameter appended.
    pub fn url(&self) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{separator}clientId={}", self.endpoint, self.client_id)
    }
}

/// Opens connections.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish one connection to `target`.
    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, TransportError>;
}

/// One established connection.
#[async_trait]
pub trait Connection: Send {
    /// Next text frame. `Ok(None)` when the peer closed the connection.
    async fn next_message(&mut self) -> Result<Option<String>, TransportError>;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Connection>, TransportError> {
        let url = target.url();
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                endpoint: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn next_message(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let message = match self.stream.next().await {
                None => return Ok(None),
                Some(result) => result.map_err(|e| TransportError::Receive(e.to_string()))?,
            };
            match message {
                Message::Text(text) => return Ok(Some(text)),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes)
                        .map(Some)
                        .map_err(|e| TransportError::Receive(format!("binary frame is not UTF-8: {e}")));
                }
                Message::Close(frame) => {
                    trace!(?frame, "close frame received");
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }
}
