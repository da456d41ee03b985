//! # Proximity Server Library
//!
//! This library implements a real-time proximity broadcast server. Clients
//! connect over WebSocket, report a team name and a GPS position, and are
//! told which other teams currently have a member within ten meters of them.
//!
//! ## Core Responsibilities
//!
//! ### Client Registry
//! The server keeps exactly one entry per open connection, created when the
//! connection is accepted and removed when it closes. Each entry carries an
//! optional team and an optional last-known location.
//!
//! ### Proximity Aggregation
//! On every location update and every disconnect, the server takes a
//! snapshot of the registry and computes, for each client with both a team
//! and a location, the closest member of every opposing team within range.
//! Distances are great-circle distances (haversine on a spherical Earth).
//!
//! ### Broadcasting
//! Each client in the aggregation receives a `nearbyTeams` message. A failed
//! send to one client is logged and never affects the others.
//!
//! ## Architecture Design
//!
//! ### Single Event Loop
//! Connection tasks only read and write frames. Everything that touches
//! client state is funneled through one channel into the server loop, which
//! applies events one at a time. Broadcast rounds therefore always observe a
//! consistent registry, without any locking.
//!
//! ### Robustness
//! Malformed messages are logged and discarded; they never close a
//! connection. Transport errors are treated like a normal close.
//!
//! ## Module Organization
//!
//! - `registry`: client ids and state, snapshots
//! - `proximity`: nearest-opposing-team aggregation
//! - `session`: per-connection lifecycle (`Connecting -> Open -> Closed`)
//! - `broadcast`: delivery of results to connections
//! - `hub`: transport-free core tying the above together
//! - `network`: WebSocket accept loop and connection tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::bind("127.0.0.1:8080").await?;
//!
//!     // Runs until the process is stopped:
//!     // - accepts WebSocket connections
//!     // - applies team and location messages in arrival order
//!     // - broadcasts nearby teams after every location update or disconnect
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod error;
pub mod hub;
pub mod network;
pub mod proximity;
pub mod registry;
pub mod session;
pub mod utils;
