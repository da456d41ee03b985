//! Error types for the proximity server

use crate::registry::ClientId;
use crate::session::SessionState;
use thiserror::Error;

/// Failure while handling one inbound message on a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("session is {0:?}, not open")]
    NotOpen(SessionState),
    #[error("session already started ({0:?})")]
    AlreadyStarted(SessionState),
}

/// Failure delivering one broadcast message to one connection
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("connection for {0} is closed")]
    ConnectionClosed(ClientId),
    #[error("failed to encode update: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
