//! Rolling-counter session engine
//!
//! After a successful handshake both peers hold the same `(init, step,
//! limit)` triple. Every authenticated message, in either direction, is
//! tagged with the operational tag of the current counters and then advances
//! `init` by `step`, so a tag is only ever valid once.
//!
//! # Shared sequence
//!
//! There is one `init` sequence for both directions. [`Direction`] only
//! records which path touched the session last. Both peers must therefore
//! strictly alternate: a lost, duplicated or reordered message leaves them
//! out of step until the next handshake.
//!
//! # State Transitions
//! ```text
//! Unauthenticated -> Authenticated (on initialize())
//! Authenticated -> Unauthenticated (on reset() or REHANDSHAKE)
//! Authenticated -> Authenticated (on initialize(), renegotiation)
//! ```

use crate::constants::REHANDSHAKE;
use crate::derivation::{CounterTriple, SecretDerivation};
use rfid_protocol::{Frame, MessageKind};

/// Which path last used the session counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Tag derived for an outgoing message
    Sending,
    /// Tag derived to check an incoming message
    #[default]
    Receiving,
}

/// Session authentication state
#[derive(Debug, Clone)]
pub struct SessionState {
    init: u32,
    step: u32,
    limit: u32,
    authenticated: bool,
    direction: Direction,
    derivation: SecretDerivation,
}

impl SessionState {
    /// Create an unauthenticated session with zeroed counters
    pub fn new(derivation: SecretDerivation) -> Self {
        Self {
            init: 0,
            step: 0,
            limit: 0,
            authenticated: false,
            direction: Direction::default(),
            derivation,
        }
    }

    /// Start a session with freshly negotiated counters
    pub fn initialize(&mut self, init: u32, step: u32, limit: u32) {
        self.init = init;
        self.step = step;
        self.limit = limit;
        self.authenticated = true;
        log::debug!("Session initialized at {}:{}:{}", init, step, limit);
    }

    /// Start a session from a parsed triple
    pub fn initialize_with(&mut self, triple: CounterTriple) {
        self.initialize(triple.init, triple.step, triple.limit);
    }

    /// Drop the session: zero the counters and clear authentication
    pub fn reset(&mut self) {
        self.init = 0;
        self.step = 0;
        self.limit = 0;
        self.authenticated = false;
        self.direction = Direction::default();
    }

    /// Tag for the current counters, optionally consuming them
    ///
    /// Returns an empty string while unauthenticated. With `increment`,
    /// `init` advances by `step` after the tag has been derived.
    pub fn next_tag(&mut self, increment: bool) -> String {
        if !self.authenticated {
            return String::new();
        }

        let tag = self.derivation.operational_tag(self.init, self.step, self.limit);
        if increment {
            self.init = self.init.saturating_add(self.step);
        }
        tag
    }

    /// Whether the counter space is used up
    pub fn needs_rehandshake(&self) -> bool {
        self.authenticated && self.init >= self.limit
    }

    /// Tag to attach to the next outgoing message
    ///
    /// Returns [`REHANDSHAKE`] without advancing once the counters are
    /// exhausted, and an empty string while unauthenticated.
    pub fn tag_for_outgoing_message(&mut self) -> String {
        if !self.authenticated {
            return String::new();
        }

        self.direction = Direction::Sending;
        if self.needs_rehandshake() {
            return REHANDSHAKE.to_string();
        }
        self.next_tag(true)
    }

    /// Check the tag of an incoming message
    ///
    /// [`REHANDSHAKE`] is accepted as is; the caller is expected to reset the
    /// session. Any other candidate is compared case-insensitively against
    /// the next tag, which is consumed whether or not it matches.
    pub fn validate_incoming_tag(&mut self, candidate: &str) -> bool {
        if !self.authenticated {
            return false;
        }

        if candidate == REHANDSHAKE {
            return true;
        }

        self.direction = Direction::Receiving;
        let expected = self.next_tag(true);
        expected.eq_ignore_ascii_case(candidate)
    }

    /// Encode a line tagged for the next outgoing exchange
    ///
    /// Falls back to an untagged line while unauthenticated.
    pub fn tagged_line(&mut self, kind: MessageKind, payload: &str) -> String {
        let tag = self.tag_for_outgoing_message();
        if tag.is_empty() {
            Frame::encode(kind, payload)
        } else {
            Frame::encode_tagged(kind, payload, &tag)
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn init(&self) -> u32 {
        self.init
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Secret material this session derives tags with
    pub fn derivation(&self) -> &SecretDerivation {
        &self.derivation
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SecretDerivation::default())
    }
}
