//! Device side of the RFID access node
//!
//! This crate ties the protocol, security and transport crates together:
//!
//! - `hardware`: the reader / indicator / button seam and a simulated board
//! - `controller`: the armed / disarmed access state machine
//! - `router`: handshake handling, tag checks and command dispatch
//! - `config`: node configuration from the environment
//! - `node`: the single-task control loop
//! - `statistics`: control loop counters

pub mod hardware;
pub mod controller;
pub mod router;
pub mod config;
pub mod statistics;
pub mod node;

pub use config::NodeConfig;
pub use controller::{card_hash, AccessController, AccessState, Signal};
pub use hardware::{Channel, Hardware, SimulatedHardware};
pub use node::Node;
pub use router::{Command, Outcome, Rejection, Router};
pub use statistics::NodeStatistics;
