//! # Probe Client Library
//!
//! A headless client for the proximity server. It is used for manual testing
//! from the command line and by the workspace integration tests.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Owns the WebSocket connection:
//! - Connecting to the server
//! - Sending team and location messages (or arbitrary raw text)
//! - Waiting for `nearbyTeams` updates
//!
//! ### Walk Module (`walk`)
//! Moves a position by a number of meters, optionally at random, so a probe
//! can imitate GPS noise around a fixed point.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::ProbeClient;
//! use shared::Coordinate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut probe = ProbeClient::connect("ws://127.0.0.1:8080").await?;
//!
//!     probe.join_team("Red").await?;
//!     probe.report_location(Coordinate::new(59.9139, 10.7522)).await?;
//!
//!     for team in probe.next_update().await? {
//!         println!("{} is {:.1} m away", team.team_name, team.distance);
//!     }
//!
//!     probe.close().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod walk;
