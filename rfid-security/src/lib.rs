//! Session security for the RFID access node
//!
//! This crate provides the tag derivation, the rolling-counter session
//! engine and the host-side handshake initiator.

pub mod constants;
pub mod derivation;
pub mod session;
pub mod initiator;

pub use derivation::{derive_tag, CounterTriple, SecretDerivation, TAG_BYTES};
pub use initiator::HandshakeInitiator;
pub use session::{Direction, SessionState};
