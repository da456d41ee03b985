//! Transport-independent core of the proximity server
//!
//! The hub owns the registry and every live session. It is driven one event
//! at a time (connect, message, disconnect) by the network layer, so no two
//! mutations or broadcast rounds ever interleave, and every round works on a
//! consistent snapshot.

use crate::broadcast::{dispatch, DispatchReport, MessageSink};
use crate::proximity::ProximityAggregator;
use crate::registry::{ClientId, ClientRegistry};
use crate::session::Session;
use log::{debug, error, info, warn};
use std::collections::HashMap;

pub struct ProximityHub<S> {
    registry: ClientRegistry,
    sessions: HashMap<ClientId, Session<S>>,
    aggregator: ProximityAggregator,
}

impl<S: MessageSink> ProximityHub<S> {
    pub fn new() -> Self {
        Self::with_aggregator(ProximityAggregator::new())
    }

    pub fn with_aggregator(aggregator: ProximityAggregator) -> Self {
        Self {
            registry: ClientRegistry::new(),
            sessions: HashMap::new(),
            aggregator,
        }
    }

    /// Opens a session for a freshly accepted connection
    pub fn connect(&mut self, sink: S) -> Option<ClientId> {
        let mut session = Session::new(sink);
        match session.open(&mut self.registry) {
            Ok(id) => {
                self.sessions.insert(id, session);
                Some(id)
            }
            Err(e) => {
                error!("Failed to open session: {}", e);
                None
            }
        }
    }

    /// Handles one inbound message. Returns the report of the broadcast
    /// round it triggered, if any.
    ///
    /// Malformed messages are logged and dropped; the session stays open.
    pub fn receive(&mut self, id: ClientId, text: &str) -> Option<DispatchReport> {
        let session = match self.sessions.get_mut(&id) {
            Some(session) => session,
            None => {
                debug!("Dropping message for unknown {}", id);
                return None;
            }
        };

        match session.handle_message(&mut self.registry, text) {
            Ok(outcome) if outcome.triggers_broadcast() => Some(self.broadcast_round()),
            Ok(_) => None,
            Err(e) => {
                warn!("Message error from {}: {}", id, e);
                None
            }
        }
    }

    /// Closes a session and runs one broadcast round for the remaining
    /// clients. Unknown or already-closed ids are ignored.
    pub fn disconnect(&mut self, id: ClientId) -> Option<DispatchReport> {
        let mut session = self.sessions.remove(&id)?;
        let last = session.close(&mut self.registry)?;

        info!(
            "{} ({}) disconnected",
            id,
            last.team_name.as_deref().unwrap_or("no team")
        );

        Some(self.broadcast_round())
    }

    /// Snapshot, aggregate and send to every subject
    pub fn broadcast_round(&mut self) -> DispatchReport {
        let snapshot = self.registry.snapshot();
        let results = self.aggregator.aggregate(&snapshot);

        info!("Broadcasting to {} clients", self.sessions.len());
        let report = dispatch(&results, &self.sessions);

        debug!(
            "Round finished: {} delivered, {} failed, {} skipped",
            report.delivered, report.failed, report.skipped
        );

        report
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<S: MessageSink> Default for ProximityHub<S> {
    fn default() -> Self {
        Self::new()
    }
}
