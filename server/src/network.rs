//! Server network layer handling WebSocket connections and the event loop

use crate::broadcast::ConnectionSink;
use crate::error::ServerError;
use crate::hub::ProximityHub;
use crate::registry::ClientId;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        addr: SocketAddr,
        sink: ConnectionSink,
        reply: oneshot::Sender<ClientId>,
    },
    MessageReceived {
        client_id: ClientId,
        text: String,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// Main server accepting connections and feeding the hub
pub struct Server {
    listener: TcpListener,
    hub: ProximityHub<ConnectionSink>,

    // Connection tasks -> main loop
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        info!("WebSocket server listening on ws://{}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            hub: ProximityHub::new(),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Applies one event to the hub. Events are handled strictly one at a time.
    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected { addr, sink, reply } => {
                if let Some(client_id) = self.hub.connect(sink) {
                    info!("{} connected from {}", client_id, addr);

                    // The connection task gave up before learning its id
                    if reply.send(client_id).is_err() {
                        self.hub.disconnect(client_id);
                    }
                }
            }
            ServerEvent::MessageReceived { client_id, text } => {
                self.hub.receive(client_id, &text);
            }
            ServerEvent::Disconnected { client_id } => {
                self.hub.disconnect(client_id);
            }
        }
    }

    /// Main server loop: accepts connections and processes their events
    ///
    /// Runs until the task is dropped; callers stop it by racing it against
    /// a shutdown signal.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!("Accepted TCP connection from {}", addr);
                            tokio::spawn(handle_connection(stream, addr, self.event_tx.clone()));
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                // The server keeps a sender, so the channel never closes
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                },
            }
        }
    }
}

/// Owns one WebSocket from handshake to close
///
/// Inbound frames are forwarded to the main loop; outbound messages are
/// written by a separate task draining the session's sink, which ends once
/// the hub drops that sink.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let (sink, mut outbound) = mpsc::unbounded_channel::<Message>();
    let (reply_tx, reply_rx) = oneshot::channel();

    if events
        .send(ServerEvent::Connected {
            addr,
            sink,
            reply: reply_tx,
        })
        .is_err()
    {
        return;
    }

    let client_id = match reply_rx.await {
        Ok(id) => id,
        Err(_) => {
            warn!("Connection from {} was not registered", addr);
            return;
        }
    };

    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if let Err(e) = write.send(message).await {
                warn!("Failed to write to {}: {}", client_id, e);
                break;
            }
        }
        let _ = write.close().await;
    });

    while let Some(frame) = read.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Message error from {}: binary frame is not UTF-8: {}", client_id, e);
                    continue;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Transport error on {}: {}", client_id, e);
                break;
            }
        };

        if events
            .send(ServerEvent::MessageReceived { client_id, text })
            .is_err()
        {
            break;
        }
    }

    if let Err(e) = events.send(ServerEvent::Disconnected { client_id }) {
        error!("Failed to report disconnect of {}: {}", client_id, e);
    }
}
