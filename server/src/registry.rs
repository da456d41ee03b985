//! Registry of connected clients and their last reported state
//!
//! This module owns every client's state for the lifetime of its connection:
//! - Identifier allocation (monotonic, never reused)
//! - Team and location updates, each replacing the previous value wholesale
//! - Removal on disconnect
//! - Point-in-time snapshots for the proximity aggregator
//!
//! Nothing else in the server keeps a copy of client state; sessions hold
//! only the `ClientId` used to look their entry up here.

use crate::utils::get_timestamp;
use log::{debug, info};
use shared::Coordinate;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier for one connection, rendered as `Client-N`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client-{}", self.0)
    }
}

/// Last reported position of a client
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub coordinate: Coordinate,
    /// Milliseconds since the Unix epoch when the position was received
    pub observed_at: u64,
}

/// State tracked for one live connection
///
/// Team and location are independent; a client only takes part in
/// proximity aggregation once both are set.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    pub id: ClientId,
    pub team_name: Option<String>,
    pub location: Option<Location>,
}

impl ClientState {
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            team_name: None,
            location: None,
        }
    }

    /// Team and position, if the client has reported both
    pub fn tracked(&self) -> Option<(&str, Coordinate)> {
        match (&self.team_name, &self.location) {
            (Some(team), Some(location)) => Some((team.as_str(), location.coordinate)),
            _ => None,
        }
    }
}

/// Authoritative mapping from connection to client state
///
/// Entries are kept ordered by id, so snapshots list clients in the order
/// they connected.
pub struct ClientRegistry {
    clients: BTreeMap<ClientId, ClientState>,
    next_client_id: u64,
}

impl ClientRegistry {
    /// Creates an empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self {
            clients: BTreeMap::new(),
            next_client_id: 1,
        }
    }

    /// Allocates a fresh id and inserts an entry with no team or location
    pub fn register(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;

        self.clients.insert(id, ClientState::new(id));
        id
    }

    /// Overwrites the team of a client. Returns false if the id is unknown.
    pub fn set_team(&mut self, id: ClientId, team_name: impl Into<String>) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) => {
                let team_name = team_name.into();
                info!("{} joined team {}", id, team_name);
                client.team_name = Some(team_name);
                true
            }
            None => false,
        }
    }

    /// Replaces the location of a client, stamped with the current time.
    /// Returns false if the id is unknown.
    pub fn set_location(&mut self, id: ClientId, coordinate: Coordinate) -> bool {
        match self.clients.get_mut(&id) {
            Some(client) => {
                debug!(
                    "{} moved to Lat: {}, Lon: {}",
                    id, coordinate.latitude, coordinate.longitude
                );
                client.location = Some(Location {
                    coordinate,
                    observed_at: get_timestamp(),
                });
                true
            }
            None => false,
        }
    }

    /// Removes a client, returning its final state. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: ClientId) -> Option<ClientState> {
        self.clients.remove(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<&ClientState> {
        self.clients.get(&id)
    }

    /// Copies every entry, ordered by id
    pub fn snapshot(&self) -> Vec<(ClientId, ClientState)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
