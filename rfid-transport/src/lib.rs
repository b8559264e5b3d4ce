//! Transport layer for the RFID access node
//!
//! This crate moves newline-terminated protocol lines between the node and
//! its host, over a serial port or an in-memory channel.

pub mod line;
pub mod serial;
pub mod memory;

pub use line::{LineBuffer, LineTransport, MAX_LINE_LENGTH};
pub use memory::{MemoryPeer, MemoryTransport};
pub use serial::{SerialLineTransport, SerialSettings};
