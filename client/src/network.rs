//! WebSocket connection to the proximity server

use futures::{SinkExt, StreamExt};
use log::{debug, info};
use shared::{ClientMessage, Coordinate, NearbyTeam, ServerMessage};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("connection closed by server")]
    Closed,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A single participant talking to the server
pub struct ProbeClient {
    stream: WsStream,
}

impl ProbeClient {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(url).await?;
        info!("Connected to {}", url);
        Ok(ProbeClient { stream })
    }

    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let text = serde_json::to_string(message)?;
        self.send_raw(&text).await
    }

    /// Sends text as-is, without checking that it is a valid message
    pub async fn send_raw(&mut self, text: &str) -> Result<(), ClientError> {
        debug!("Sending {}", text);
        self.stream.send(Message::text(text.to_owned())).await?;
        Ok(())
    }

    /// Sends a binary frame, which the server decodes as UTF-8 text
    pub async fn send_binary(&mut self, bytes: Vec<u8>) -> Result<(), ClientError> {
        debug!("Sending {} binary bytes", bytes.len());
        self.stream.send(Message::binary(bytes)).await?;
        Ok(())
    }

    pub async fn join_team(&mut self, team: &str) -> Result<(), ClientError> {
        info!("Joining team {}", team);
        self.send(&ClientMessage::team(team)).await
    }

    pub async fn report_location(&mut self, coordinate: Coordinate) -> Result<(), ClientError> {
        self.send(&ClientMessage::location(coordinate)).await
    }

    /// Waits for the next `nearbyTeams` update
    pub async fn next_update(&mut self) -> Result<Vec<NearbyTeam>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => {
                    let ServerMessage::NearbyTeams { nearby_teams } = serde_json::from_str(&text)?;
                    return Ok(nearby_teams);
                }
                Message::Close(_) => break,
                _ => continue,
            }
        }

        Err(ClientError::Closed)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
