//! Test WebSocket client.
//!
//! Connects to a test gateway with a session cookie and query parameters,
//! and exposes the control frames as JSON values.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A test collaboration client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a WebSocket to `addr` with the given cookie and query string.
    pub async fn connect(
        addr: SocketAddr,
        cookie: Option<&str>,
        query: &str,
    ) -> anyhow::Result<Self> {
        let mut request = format!("ws://{addr}/collaboration?{query}").into_client_request()?;
        if let Some(cookie) = cookie {
            request
                .headers_mut()
                .insert(COOKIE, HeaderValue::from_str(cookie)?);
        }
        let (ws, _) = connect_async(request).await?;
        Ok(Self { ws })
    }

    /// Open a WebSocket with an explicit `Origin` header.
    pub async fn connect_with_origin(addr: SocketAddr, origin: &str) -> anyhow::Result<Self> {
        let mut request = format!("ws://{addr}/collaboration").into_client_request()?;
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_str(origin)?);
        let (ws, _) = connect_async(request).await?;
        Ok(Self { ws })
    }

    /// Send the auth frame carrying `token`.
    pub async fn authenticate(&mut self, token: &str) -> anyhow::Result<()> {
        self.send_text(&json!({ "type": "auth", "token": token }).to_string())
            .await
    }

    pub async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.ws.send(Message::Binary(data.to_vec())).await?;
        Ok(())
    }

    /// Receive the next message, skipping pings and pongs.
    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        loop {
            let frame = timeout(Duration::from_secs(5), self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            if !matches!(frame, Message::Ping(_) | Message::Pong(_)) {
                return Ok(frame);
            }
        }
    }

    /// Receive the next message and decode it as a JSON control frame.
    pub async fn recv_json(&mut self) -> anyhow::Result<Value> {
        match self.recv().await? {
            Message::Text(text) => Ok(serde_json::from_str(&text)?),
            other => anyhow::bail!("expected text frame, got {other:?}"),
        }
    }

    /// Expect a close frame and return it.
    pub async fn recv_close(&mut self) -> anyhow::Result<Option<CloseFrame<'static>>> {
        match self.recv().await? {
            Message::Close(frame) => Ok(frame),
            other => anyhow::bail!("expected close frame, got {other:?}"),
        }
    }

    pub async fn close(mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
