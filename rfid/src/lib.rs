//! RFID access node firmware core
//!
//! A node sits next to a door, talks to a host over a serial line and
//! reports the cards presented to its reader once the host has armed it.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `rfid-core`: Error handling
//! - `rfid-protocol`: Line framing (`KIND_payload|tag`) and the reply queue
//! - `rfid-security`: Tag derivation, rolling session counters, handshake initiator
//! - `rfid-transport`: Line transports (serial, in-memory)
//! - `rfid-device`: Router, access controller, hardware seam and control loop
//!
//! # Usage
//!
//! ```no_run
//! use rfid::device::{Node, NodeConfig, SimulatedHardware};
//! use rfid::transport::SerialLineTransport;
//!
//! # async fn start() -> rfid::AccessResult<()> {
//! let config = NodeConfig::from_env()?;
//! let mut transport = SerialLineTransport::new(config.serial.clone());
//! transport.open()?;
//! let mut node = Node::with_config(transport, SimulatedHardware::new(), &config);
//! node.run().await
//! # }
//! ```

// Re-export core types
pub use rfid_core::{AccessError, AccessResult};

// Re-export wire protocol
pub mod protocol {
    pub use rfid_protocol::*;
}

// Re-export session security
pub mod security {
    pub use rfid_security::*;
}

// Re-export transports
pub mod transport {
    pub use rfid_transport::*;
}

// Re-export device API
pub mod device {
    pub use rfid_device::*;
}
