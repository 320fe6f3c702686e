//! Minimal signaling client over `tokio-tungstenite`.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use signaling_relay::protocol::ServerEvent;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long [`TestClient::recv`] waits before failing the test.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a WebSocket. Fails on a rejected upgrade (e.g. 401).
    pub async fn connect(url: &str) -> Result<Self, anyhow::Error> {
        let (stream, _response) = connect_async(url).await?;
        Ok(Self { stream })
    }

    pub async fn send_json(&mut self, frame: &Value) -> Result<(), anyhow::Error> {
        self.send_text(&frame.to_string()).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<(), anyhow::Error> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Next server event, skipping control frames.
    pub async fn recv(&mut self) -> Result<ServerEvent, anyhow::Error> {
        tokio::time::timeout(RECV_TIMEOUT, self.next_event())
            .await
            .map_err(|_| anyhow::anyhow!("no server event within {:?}", RECV_TIMEOUT))?
    }

    /// `true` if nothing arrives within `wait`.
    pub async fn is_silent_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.next_event()).await.is_err()
    }

    pub async fn close(mut self) -> Result<(), anyhow::Error> {
        self.stream.close(None).await?;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<ServerEvent, anyhow::Error> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => break,
                _ => {}
            }
        }
        Err(anyhow::anyhow!("connection closed"))
    }
}
