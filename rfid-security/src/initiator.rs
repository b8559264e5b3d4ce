//! Host side of the handshake
//!
//! The host picks the counter triple, proves knowledge of the handshake
//! secret by hashing it, and sends
//!
//! ```text
//! AUTH_HDSHK_INIT|<handshake tag>&<init>:<step>:<limit>
//! ```
//!
//! Once the node answers `OK_HANDSHAKE SUCCESSFUL`, both sides hold the same
//! counters and the host tags its commands with
//! [`SessionState::tagged_line`].

use crate::constants::{
    HANDSHAKE_INIT, HANDSHAKE_TAG_SEPARATOR, INIT_RANGE, LIMIT_RANGE, STEP_RANGE,
};
use crate::derivation::{CounterTriple, SecretDerivation};
use crate::session::SessionState;
use rand::Rng;
use rfid_protocol::{Frame, MessageKind};

/// Builds handshake requests for a counter triple
#[derive(Debug, Clone)]
pub struct HandshakeInitiator {
    derivation: SecretDerivation,
    triple: CounterTriple,
}

impl HandshakeInitiator {
    /// Create an initiator with a randomly drawn triple
    pub fn new(derivation: SecretDerivation) -> Self {
        let mut rng = rand::thread_rng();
        let triple = CounterTriple::new(
            rng.gen_range(INIT_RANGE),
            rng.gen_range(STEP_RANGE),
            rng.gen_range(LIMIT_RANGE),
        );
        Self::with_triple(derivation, triple)
    }

    /// Create an initiator for a fixed triple
    pub fn with_triple(derivation: SecretDerivation, triple: CounterTriple) -> Self {
        Self { derivation, triple }
    }

    pub fn triple(&self) -> CounterTriple {
        self.triple
    }

    /// Handshake tag: `<hash>&<init>:<step>:<limit>`
    pub fn handshake_tag(&self) -> String {
        format!(
            "{}{}{}",
            self.derivation.handshake_tag(&self.triple),
            HANDSHAKE_TAG_SEPARATOR,
            self.triple
        )
    }

    /// Full handshake request line
    pub fn handshake_line(&self) -> String {
        Frame::encode_tagged(MessageKind::Auth, HANDSHAKE_INIT, &self.handshake_tag())
    }

    /// Host-side session for the negotiated triple
    ///
    /// Call once the node has confirmed the handshake.
    pub fn establish(self) -> SessionState {
        let mut session = SessionState::new(self.derivation);
        session.initialize_with(self.triple);
        session
    }
}
