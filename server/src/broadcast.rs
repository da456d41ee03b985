//! Delivery of proximity results to live connections

use crate::error::DispatchError;
use crate::proximity::ProximityResults;
use crate::registry::ClientId;
use crate::session::Session;
use log::warn;
use shared::ServerMessage;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Outbound queue feeding a connection's writer task
pub type ConnectionSink = mpsc::UnboundedSender<Message>;

/// Somewhere serialized server messages can be sent
pub trait MessageSink {
    /// Whether the underlying connection still accepts messages
    fn is_open(&self) -> bool;

    fn send_text(&self, id: ClientId, text: String) -> Result<(), DispatchError>;
}

impl MessageSink for ConnectionSink {
    fn is_open(&self) -> bool {
        !self.is_closed()
    }

    fn send_text(&self, id: ClientId, text: String) -> Result<(), DispatchError> {
        self.send(Message::text(text))
            .map_err(|_| DispatchError::ConnectionClosed(id))
    }
}

/// Counts for one broadcast round
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Subjects whose session was gone or closed at send time
    pub skipped: usize,
}

/// Sends each subject its `nearbyTeams` update
///
/// A failure on one connection is logged and counted; it never stops
/// delivery to the others, and the failing session is left in place.
pub fn dispatch<S: MessageSink>(
    results: &ProximityResults,
    sessions: &HashMap<ClientId, Session<S>>,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for (id, nearby_teams) in results {
        let session = match sessions.get(id) {
            Some(session) if session.is_open() && session.sink().is_open() => session,
            _ => {
                report.skipped += 1;
                continue;
            }
        };

        let message = ServerMessage::NearbyTeams {
            nearby_teams: nearby_teams.clone(),
        };

        let sent = serde_json::to_string(&message)
            .map_err(DispatchError::from)
            .and_then(|text| session.sink().send_text(*id, text));

        match sent {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("Error sending to {}: {}", id, e);
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClientRegistry;
    use shared::NearbyTeam;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<String>>>,
        broken: bool,
        closed: bool,
    }

    impl MessageSink for RecordingSink {
        fn is_open(&self) -> bool {
            !self.closed
        }

        fn send_text(&self, id: ClientId, text: String) -> Result<(), DispatchError> {
            if self.broken {
                return Err(DispatchError::ConnectionClosed(id));
            }
            self.sent.lock().unwrap().push(text);
            Ok(())
        }
    }

    fn open(
        registry: &mut ClientRegistry,
        sessions: &mut HashMap<ClientId, Session<RecordingSink>>,
        sink: RecordingSink,
    ) -> ClientId {
        let mut session = Session::new(sink);
        let id = session.open(registry).unwrap();
        sessions.insert(id, session);
        id
    }

    fn blue_at(distance: f64) -> Vec<NearbyTeam> {
        vec![NearbyTeam {
            team_name: "Blue".to_string(),
            distance,
        }]
    }

    #[test]
    fn test_dispatch_delivers_serialized_update() {
        let mut registry = ClientRegistry::new();
        let mut sessions = HashMap::new();
        let sink = RecordingSink::default();
        let id = open(&mut registry, &mut sessions, sink.clone());

        let mut results = ProximityResults::new();
        results.insert(id, blue_at(4.0));

        let report = dispatch(&results, &sessions);

        assert_eq!(report.delivered, 1);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(
            sent[0],
            r#"{"type":"nearbyTeams","nearbyTeams":[{"teamName":"Blue","distance":4.0}]}"#
        );
    }

    #[test]
    fn test_one_failure_does_not_block_others() {
        let mut registry = ClientRegistry::new();
        let mut sessions = HashMap::new();
        let broken = open(
            &mut registry,
            &mut sessions,
            RecordingSink {
                broken: true,
                ..RecordingSink::default()
            },
        );
        let healthy_sink = RecordingSink::default();
        let healthy = open(&mut registry, &mut sessions, healthy_sink.clone());

        let mut results = ProximityResults::new();
        results.insert(broken, blue_at(1.0));
        results.insert(healthy, vec![]);

        let report = dispatch(&results, &sessions);

        assert_eq!(
            report,
            DispatchReport {
                delivered: 1,
                failed: 1,
                skipped: 0
            }
        );
        assert_eq!(healthy_sink.sent.lock().unwrap().len(), 1);
        // Dispatch never removes the failing session
        assert!(sessions.contains_key(&broken));
        assert!(registry.get(broken).is_some());
    }

    #[test]
    fn test_closed_and_missing_connections_are_skipped() {
        let mut registry = ClientRegistry::new();
        let mut sessions = HashMap::new();
        let closed_sink = RecordingSink {
            closed: true,
            ..RecordingSink::default()
        };
        let closed = open(&mut registry, &mut sessions, closed_sink.clone());
        let gone = registry.register();

        let mut results = ProximityResults::new();
        results.insert(closed, vec![]);
        results.insert(gone, vec![]);

        let report = dispatch(&results, &sessions);

        assert_eq!(report.skipped, 2);
        assert_eq!(report.delivered, 0);
        assert!(closed_sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clients_without_results_receive_nothing() {
        let mut registry = ClientRegistry::new();
        let mut sessions = HashMap::new();
        let idle_sink = RecordingSink::default();
        open(&mut registry, &mut sessions, idle_sink.clone());

        let report = dispatch(&ProximityResults::new(), &sessions);

        assert_eq!(report, DispatchReport::default());
        assert!(idle_sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_connection_sink_reports_closed_receiver() {
        let mut registry = ClientRegistry::new();
        let id = registry.register();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        assert!(MessageSink::is_open(&tx));
        tx.send_text(id, "hello".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Message::text("hello"));

        drop(rx);
        assert!(!MessageSink::is_open(&tx));
        assert!(matches!(
            tx.send_text(id, "late".to_string()),
            Err(DispatchError::ConnectionClosed(_))
        ));
    }
}
