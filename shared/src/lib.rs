use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const PROXIMITY_RADIUS_METERS: f64 = 10.0;
pub const DEFAULT_PORT: u16 = 8080;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance in meters between two coordinates (haversine, spherical Earth).
///
/// Inputs are not range-checked. Deltas are taken as absolute values so the
/// result is bit-for-bit identical regardless of argument order.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).abs().to_radians();
    let delta_lambda = (b.longitude - a.longitude).abs().to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // rounding can push h just past 1 near antipodes
    let h = h.min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Message sent by a client. Every field is optional; a location update
/// requires both `latitude` and `longitude`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl ClientMessage {
    /// Parses inbound text. Anything other than a JSON object is rejected.
    ///
    /// Fields are picked by presence: a `teamName` that is not a string or a
    /// coordinate that is not a number reads as absent, without affecting the
    /// other fields.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(text)?;

        Ok(Self {
            team_name: object
                .get("teamName")
                .and_then(Value::as_str)
                .map(str::to_owned),
            latitude: object.get("latitude").and_then(Value::as_f64),
            longitude: object.get("longitude").and_then(Value::as_f64),
        })
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            team_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn location(coordinate: Coordinate) -> Self {
        Self {
            team_name: None,
            latitude: Some(coordinate.latitude),
            longitude: Some(coordinate.longitude),
        }
    }

    /// Both halves of the position, if present. Zero is a valid value.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        }
    }
}

/// One opposing team within range of the receiving client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyTeam {
    pub team_name: String,
    /// Distance in meters to the closest member of this team.
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "nearbyTeams")]
    NearbyTeams {
        #[serde(rename = "nearbyTeams")]
        nearby_teams: Vec<NearbyTeam>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;

    /// Degrees of longitude spanning `meters` along the equator
    fn meters_east(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_METERS).to_degrees()
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        let points = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(59.9139, 10.7522),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(90.0, 0.0),
        ];

        for p in points {
            assert_eq!(distance(&p, &p), 0.0);
        }
    }

    #[test]
    fn test_distance_symmetry() {
        let pairs = [
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, meters_east(5.0))),
            (Coordinate::new(63.4305, 10.3951), Coordinate::new(59.9139, 10.7522)),
            (Coordinate::new(-33.8688, 151.2093), Coordinate::new(40.7128, -74.0060)),
            (Coordinate::new(10.0, 179.9), Coordinate::new(-10.0, -179.9)),
        ];

        for (a, b) in pairs {
            assert_eq!(distance(&a, &b), distance(&b, &a));
            assert!(distance(&a, &b) >= 0.0);
        }
    }

    #[test]
    fn test_distance_along_equator() {
        let origin = Coordinate::new(0.0, 0.0);
        let east = Coordinate::new(0.0, meters_east(5.0));
        assert_approx_eq!(distance(&origin, &east), 5.0, 1e-6);
    }

    #[test]
    fn test_distance_known_cities() {
        // Oslo to Trondheim is roughly 392 km as the crow flies
        let oslo = Coordinate::new(59.9139, 10.7522);
        let trondheim = Coordinate::new(63.4305, 10.3951);
        let d = distance(&oslo, &trondheim);
        assert!((390_000.0..395_000.0).contains(&d), "got {}", d);
    }

    #[test]
    fn test_distance_antipodal() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        assert_approx_eq!(distance(&a, &b), std::f64::consts::PI * EARTH_RADIUS_METERS, 1e-3);
    }

    #[test]
    fn test_parse_full_message() {
        let msg =
            ClientMessage::parse(r#"{"teamName":"Red","latitude":1.5,"longitude":-2.25}"#).unwrap();
        assert_eq!(msg.team_name.as_deref(), Some("Red"));
        assert_eq!(msg.coordinate(), Some(Coordinate::new(1.5, -2.25)));
    }

    #[test]
    fn test_parse_zero_coordinates_is_a_location() {
        let msg = ClientMessage::parse(r#"{"latitude":0,"longitude":0}"#).unwrap();
        assert_eq!(msg.coordinate(), Some(Coordinate::new(0.0, 0.0)));
    }

    #[test]
    fn test_parse_partial_location() {
        let msg = ClientMessage::parse(r#"{"latitude":12.0}"#).unwrap();
        assert_eq!(msg.latitude, Some(12.0));
        assert_eq!(msg.coordinate(), None);

        let msg = ClientMessage::parse(r#"{"longitude":12.0,"latitude":null}"#).unwrap();
        assert_eq!(msg.coordinate(), None);
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let msg = ClientMessage::parse(r#"{"heading":90,"teamName":"Blue"}"#).unwrap();
        assert_eq!(msg, ClientMessage::team("Blue"));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        let inputs = [
            "",
            "not json",
            "{\"teamName\":",
            "42",
            "\"Red\"",
            "[\"Red\", 1.0, 2.0]",
        ];

        for input in inputs {
            assert!(ClientMessage::parse(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_parse_wrong_types_read_as_absent() {
        let msg =
            ClientMessage::parse(r#"{"teamName":"Red","latitude":"1.5","longitude":2.0}"#).unwrap();
        assert_eq!(msg.team_name.as_deref(), Some("Red"));
        assert_eq!(msg.latitude, None);
        assert_eq!(msg.coordinate(), None);

        let msg = ClientMessage::parse(r#"{"teamName":7,"latitude":1,"longitude":2}"#).unwrap();
        assert_eq!(msg.team_name, None);
        assert_eq!(msg.coordinate(), Some(Coordinate::new(1.0, 2.0)));
    }

    #[test]
    fn test_client_message_skips_absent_fields() {
        let json = serde_json::to_value(ClientMessage::team("Red")).unwrap();
        assert_eq!(json, json!({ "teamName": "Red" }));

        let json = serde_json::to_value(ClientMessage::location(Coordinate::new(1.0, 2.0))).unwrap();
        assert_eq!(json, json!({ "latitude": 1.0, "longitude": 2.0 }));
    }

    #[test]
    fn test_server_message_wire_format() {
        let msg = ServerMessage::NearbyTeams {
            nearby_teams: vec![NearbyTeam {
                team_name: "Blue".to_string(),
                distance: 4.5,
            }],
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "nearbyTeams",
                "nearbyTeams": [{ "teamName": "Blue", "distance": 4.5 }]
            })
        );

        let empty = ServerMessage::NearbyTeams {
            nearby_teams: vec![],
        };
        assert_eq!(
            serde_json::to_string(&empty).unwrap(),
            r#"{"type":"nearbyTeams","nearbyTeams":[]}"#
        );
    }

    #[test]
    fn test_server_message_parses_back() {
        let text = r#"{"type":"nearbyTeams","nearbyTeams":[{"teamName":"Red","distance":3.0}]}"#;
        let ServerMessage::NearbyTeams { nearby_teams } = serde_json::from_str(text).unwrap();
        assert_eq!(nearby_teams.len(), 1);
        assert_eq!(nearby_teams[0].team_name, "Red");
        assert_approx_eq!(nearby_teams[0].distance, 3.0);
    }
}
