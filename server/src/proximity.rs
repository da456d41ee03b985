//! Nearest-opposing-team aggregation over a registry snapshot

use crate::registry::{ClientId, ClientState};
use log::debug;
use shared::{distance, Coordinate, NearbyTeam, PROXIMITY_RADIUS_METERS};
use std::collections::BTreeMap;

/// Per-subject results of one aggregation pass
pub type ProximityResults = BTreeMap<ClientId, Vec<NearbyTeam>>;

#[derive(Debug, Clone, Copy)]
pub struct ProximityAggregator {
    radius_meters: f64,
}

impl ProximityAggregator {
    pub fn new() -> Self {
        Self::with_radius(PROXIMITY_RADIUS_METERS)
    }

    pub fn with_radius(radius_meters: f64) -> Self {
        Self { radius_meters }
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Computes, for every client with both a team and a location, the
    /// closest member of each other team within the radius.
    ///
    /// Clients missing either field produce no entry and are never
    /// candidates. Pairs are compared exhaustively, which is fine for the
    /// tens of clients this server is meant for. Entries are sorted by team
    /// name.
    pub fn aggregate(&self, snapshot: &[(ClientId, ClientState)]) -> ProximityResults {
        let tracked: Vec<(ClientId, &str, Coordinate)> = snapshot
            .iter()
            .filter_map(|(id, client)| client.tracked().map(|(team, at)| (*id, team, at)))
            .collect();

        let mut results = ProximityResults::new();

        for &(subject_id, subject_team, subject_at) in &tracked {
            let mut closest: BTreeMap<&str, f64> = BTreeMap::new();

            for &(_, other_team, other_at) in &tracked {
                // Teammates, including the subject itself, never count
                if other_team == subject_team {
                    continue;
                }

                let d = distance(&subject_at, &other_at);
                if d > self.radius_meters {
                    continue;
                }

                closest
                    .entry(other_team)
                    .and_modify(|best| {
                        if d < *best {
                            *best = d;
                        }
                    })
                    .or_insert(d);
            }

            debug!(
                "Nearby teams for {} ({}) at Lat: {}, Lon: {}:",
                subject_id, subject_team, subject_at.latitude, subject_at.longitude
            );
            for (team, d) in &closest {
                debug!("- {}: {} meters away", team, d.round());
            }

            let nearby = closest
                .into_iter()
                .map(|(team, d)| NearbyTeam {
                    team_name: team.to_string(),
                    distance: d,
                })
                .collect();
            results.insert(subject_id, nearby);
        }

        results
    }
}

impl Default for ProximityAggregator {
    fn default() -> Self {
        Self::new()
    }
}
