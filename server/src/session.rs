//! Per-connection session lifecycle
//!
//! A session moves `Connecting -> Open -> Closed` and never back. Opening
//! registers the client, inbound messages mutate its registry entry, and
//! closing removes it. The session keeps only the `ClientId`; the registry
//! stays the single owner of client state.

use crate::error::SessionError;
use crate::registry::{ClientId, ClientRegistry, ClientState};
use shared::ClientMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// What an inbound message changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessageOutcome {
    pub team_updated: bool,
    pub location_updated: bool,
}

impl MessageOutcome {
    /// Only location updates start a broadcast round
    pub fn triggers_broadcast(&self) -> bool {
        self.location_updated
    }
}

/// One connection and the outbound sink used to reach it
#[derive(Debug)]
pub struct Session<S> {
    client_id: Option<ClientId>,
    state: SessionState,
    sink: S,
}

impl<S> Session<S> {
    pub fn new(sink: S) -> Self {
        Self {
            client_id: None,
            state: SessionState::Connecting,
            sink,
        }
    }

    /// Registers the client and moves the session to Open
    pub fn open(&mut self, registry: &mut ClientRegistry) -> Result<ClientId, SessionError> {
        if self.state != SessionState::Connecting {
            return Err(SessionError::AlreadyStarted(self.state));
        }

        let id = registry.register();
        self.client_id = Some(id);
        self.state = SessionState::Open;
        Ok(id)
    }

    /// Applies one inbound text message to this client's registry entry
    ///
    /// A team name and a location may arrive in the same message; both are
    /// applied. Parse failures leave the session open and the registry
    /// untouched.
    pub fn handle_message(
        &mut self,
        registry: &mut ClientRegistry,
        text: &str,
    ) -> Result<MessageOutcome, SessionError> {
        let id = match (self.state, self.client_id) {
            (SessionState::Open, Some(id)) => id,
            (state, _) => return Err(SessionError::NotOpen(state)),
        };

        let message = ClientMessage::parse(text)?;
        let coordinate = message.coordinate();
        let mut outcome = MessageOutcome::default();

        if let Some(team_name) = message.team_name {
            outcome.team_updated = registry.set_team(id, team_name);
        }

        if let Some(coordinate) = coordinate {
            outcome.location_updated = registry.set_location(id, coordinate);
        }

        Ok(outcome)
    }

    /// Removes the client and moves the session to Closed
    ///
    /// Returns the client's final state the first time an open session is
    /// closed, and `None` on any later call.
    pub fn close(&mut self, registry: &mut ClientRegistry) -> Option<ClientState> {
        if self.state != SessionState::Open {
            self.state = SessionState::Closed;
            return None;
        }

        self.state = SessionState::Closed;
        self.client_id.and_then(|id| registry.remove(id))
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
