//! Frame routing, handshake handling and command dispatch
//!
//! `AUTH` frames always go to the handshake handler. Every other frame must
//! carry the next rolling tag of the session before it is dispatched; only
//! `CMD` frames have a route.

use crate::controller::AccessController;
use crate::hardware::Hardware;
use rfid_core::{AccessError, AccessResult};
use rfid_protocol::{Frame, MessageKind, ReplyQueue};
use rfid_security::constants::{HANDSHAKE_INIT, HANDSHAKE_TAG_SEPARATOR, REHANDSHAKE};
use rfid_security::{CounterTriple, SessionState};
use std::fmt;
use std::str::FromStr;

/// Commands the host may issue once authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Enable,
    Disable,
    Permit,
    Deny,
    SoundDeny,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Enable,
        Command::Disable,
        Command::Permit,
        Command::Deny,
        Command::SoundDeny,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Enable => "ENABLE",
            Command::Disable => "DISABLE",
            Command::Permit => "PERMIT",
            Command::Deny => "DENY",
            Command::SoundDeny => "SOUND_DENY",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = AccessError;

    /// Case-insensitive match against the command vocabulary
    fn from_str(s: &str) -> AccessResult<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AccessError::Protocol(format!("Unknown command: {}", s)))
    }
}

/// Why a frame was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No handshake has completed
    NotAuthenticated,
    /// Peer asked to renegotiate; the session has been reset
    RehandshakeRequested,
    /// Tag missing or not the next rolling tag
    TagMismatch,
    /// Handshake tag without `hash&triple` shape
    MalformedHandshake,
    /// Claimed handshake hash does not match
    HandshakeFailed,
    /// Counter triple is not `init:step:limit` with positive integers
    InvalidAuthValues,
    /// Authenticated frame of a kind that has no route
    RouteNotFound,
}

impl Rejection {
    /// Queue the reply lines for this rejection
    pub fn reply(&self, replies: &mut ReplyQueue) {
        match self {
            Rejection::NotAuthenticated => {
                replies.err("NOT AUTHENTICATED");
                replies.err("AUTHENTICATION FAILED");
            }
            Rejection::RehandshakeRequested => {
                replies.info("REHANDSHAKE REQUESTED");
                replies.err("AUTHENTICATION FAILED");
            }
            Rejection::TagMismatch => replies.err("AUTHENTICATION FAILED"),
            Rejection::MalformedHandshake => replies.err("INVALID HANDSHAKE FORMAT"),
            Rejection::HandshakeFailed => replies.err("HANDSHAKE FAILED"),
            Rejection::InvalidAuthValues => replies.err("INVALID AUTH VALUES FORMAT"),
            Rejection::RouteNotFound => replies.err("NOT FOUND ROUTE"),
        }
    }
}

/// Result of routing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handshake accepted, session (re)initialized
    HandshakeAccepted(CounterTriple),
    /// Authenticated command executed
    Dispatched(Command),
    /// Frame refused; the rejection reply has been queued
    Rejected(Rejection),
    /// Frame dropped without a reply
    Ignored,
}

/// Dispatcher over the session and the access controller
///
/// Holds no state of its own; it borrows both service objects for the
/// duration of one dispatch.
pub struct Router<'a, H: Hardware> {
    session: &'a mut SessionState,
    controller: &'a mut AccessController<H>,
}

impl<'a, H: Hardware> Router<'a, H> {
    pub fn new(session: &'a mut SessionState, controller: &'a mut AccessController<H>) -> Self {
        Self {
            session,
            controller,
        }
    }

    /// Route one decoded frame, queueing any replies
    pub fn route(&mut self, frame: &Frame, replies: &mut ReplyQueue) -> Outcome {
        let result = match frame.kind() {
            MessageKind::Auth => self.handle_auth(frame),
            _ => self
                .authenticate(frame)
                .and_then(|()| self.dispatch_authenticated(frame, replies)),
        };

        match result {
            Ok(Outcome::HandshakeAccepted(triple)) => {
                replies.ok("HANDSHAKE SUCCESSFUL");
                Outcome::HandshakeAccepted(triple)
            }
            Ok(outcome) => outcome,
            Err(rejection) => {
                log::warn!("Rejected {} frame: {:?}", frame.kind(), rejection);
                rejection.reply(replies);
                Outcome::Rejected(rejection)
            }
        }
    }

    fn authenticate(&mut self, frame: &Frame) -> Result<(), Rejection> {
        if !self.session.is_authenticated() {
            return Err(Rejection::NotAuthenticated);
        }

        let candidate = frame.tag().unwrap_or_default();
        if candidate == REHANDSHAKE {
            log::info!("Peer requested rehandshake, resetting session");
            self.session.reset();
            return Err(Rejection::RehandshakeRequested);
        }

        if self.session.validate_incoming_tag(candidate) {
            Ok(())
        } else {
            Err(Rejection::TagMismatch)
        }
    }

    fn dispatch_authenticated(
        &mut self,
        frame: &Frame,
        replies: &mut ReplyQueue,
    ) -> Result<Outcome, Rejection> {
        match frame.kind() {
            MessageKind::Cmd => Ok(self.handle_command(frame.payload(), replies)),
            MessageKind::Auth
            | MessageKind::Info
            | MessageKind::Err
            | MessageKind::Ack
            | MessageKind::Miss
            | MessageKind::Ok => Err(Rejection::RouteNotFound),
        }
    }

    /// Handshake: `AUTH_HDSHK_INIT|<hash>&<init>:<step>:<limit>`
    ///
    /// The claimed hash is checked first, over the counters as written; only
    /// then are the counters validated. Nothing is written to the session
    /// unless both succeed.
    fn handle_auth(&mut self, frame: &Frame) -> Result<Outcome, Rejection> {
        if !frame.payload().starts_with(HANDSHAKE_INIT) {
            log::debug!("Ignoring AUTH frame with payload {:?}", frame.payload());
            return Ok(Outcome::Ignored);
        }

        let (claimed, counters) = frame
            .tag()
            .and_then(|tag| tag.split_once(HANDSHAKE_TAG_SEPARATOR))
            .ok_or(Rejection::MalformedHandshake)?;

        let written = CounterTriple::parse_lenient(counters);
        let expected = self.session.derivation().handshake_tag(&written);
        if !expected.eq_ignore_ascii_case(claimed) {
            return Err(Rejection::HandshakeFailed);
        }

        let triple = CounterTriple::parse(counters).ok_or(Rejection::InvalidAuthValues)?;

        self.session.initialize_with(triple);
        log::info!("Handshake successful");
        Ok(Outcome::HandshakeAccepted(triple))
    }

    /// Unknown verbs are dropped without a reply
    fn handle_command(&mut self, payload: &str, replies: &mut ReplyQueue) -> Outcome {
        let command = match payload.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                log::debug!("{}", e);
                return Outcome::Ignored;
            }
        };

        replies.ack(&format!("RECEIVED {}", command));
        match command {
            Command::Enable => self.controller.enable(replies),
            Command::Disable => self.controller.disable(replies),
            Command::Permit => self.controller.permit(replies),
            Command::Deny => self.controller.deny(replies),
            Command::SoundDeny => self.controller.sound_deny(replies),
        }
        Outcome::Dispatched(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::AccessState;
    use crate::hardware::SimulatedHardware;
    use rfid_security::{derive_tag, SecretDerivation};

    struct Fixture {
        session: SessionState,
        controller: AccessController<SimulatedHardware>,
        replies: ReplyQueue,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                session: SessionState::new(SecretDerivation::new("hs", "op")),
                controller: AccessController::new(SimulatedHardware::new()),
                replies: ReplyQueue::new(),
            }
        }

        fn route(&mut self, line: &str) -> Outcome {
            let frame = Frame::decode(line).expect("test line must decode");
            Router::new(&mut self.session, &mut self.controller).route(&frame, &mut self.replies)
        }

        fn handshake(&mut self, init: u32, step: u32, limit: u32) -> Outcome {
            let hash = derive_tag("hs", init, step, limit);
            self.route(&format!("AUTH_HDSHK_INIT|{}&{}:{}:{}", hash, init, step, limit))
        }
    }

    #[test]
    fn test_command_parsing_is_case_insensitive() {
        for text in ["enable", "ENABLE", "Enable"] {
            assert_eq!(text.parse::<Command>().unwrap(), Command::Enable);
        }
        assert_eq!("sound_deny".parse::<Command>().unwrap(), Command::SoundDeny);
        assert!("FOO".parse::<Command>().is_err());
    }

    #[test]
    fn test_unauthenticated_command_rejected() {
        let mut fx = Fixture::new();
        let outcome = fx.route("CMD_ENABLE|whatever");
        assert_eq!(outcome, Outcome::Rejected(Rejection::NotAuthenticated));
        assert_eq!(fx.controller.state(), AccessState::Unavailable);
        assert_eq!(
            fx.replies.drain(),
            vec!["ERR_NOT AUTHENTICATED", "ERR_AUTHENTICATION FAILED"]
        );
    }

    #[test]
    fn test_handshake_success() {
        let mut fx = Fixture::new();
        let outcome = fx.handshake(10, 5, 100);
        assert_eq!(outcome, Outcome::HandshakeAccepted(CounterTriple::new(10, 5, 100)));
        assert!(fx.session.is_authenticated());
        assert_eq!((fx.session.init(), fx.session.step(), fx.session.limit()), (10, 5, 100));
        assert_eq!(fx.replies.drain(), vec!["OK_HANDSHAKE SUCCESSFUL"]);
    }

    #[test]
    fn test_handshake_hash_is_case_insensitive() {
        let mut fx = Fixture::new();
        let hash = derive_tag("hs", 996, 14, 6698).to_uppercase();
        let outcome = fx.route(&format!("AUTH_HDSHK_INIT|{}&996:14:6698", hash));
        assert!(matches!(outcome, Outcome::HandshakeAccepted(_)));
    }

    #[test]
    fn test_handshake_single_char_mutation_fails() {
        let good = derive_tag("hs", 996, 14, 6698);
        for i in 0..good.len() {
            let mut mutated: Vec<char> = good.chars().collect();
            mutated[i] = if mutated[i] == '0' { '1' } else { '0' };
            let mutated: String = mutated.into_iter().collect();

            let mut fx = Fixture::new();
            let outcome = fx.route(&format!("AUTH_HDSHK_INIT|{}&996:14:6698", mutated));
            assert_eq!(outcome, Outcome::Rejected(Rejection::HandshakeFailed));
            assert!(!fx.session.is_authenticated());
            assert_eq!(fx.replies.drain(), vec!["ERR_HANDSHAKE FAILED"]);
        }
    }

    #[test]
    fn test_handshake_with_operational_secret_fails() {
        let mut fx = Fixture::new();
        let hash = derive_tag("op", 10, 5, 100);
        let outcome = fx.route(&format!("AUTH_HDSHK_INIT|{}&10:5:100", hash));
        assert_eq!(outcome, Outcome::Rejected(Rejection::HandshakeFailed));
    }

    #[test]
    fn test_malformed_handshake() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.route("AUTH_HDSHK_INIT"),
            Outcome::Rejected(Rejection::MalformedHandshake)
        );
        assert_eq!(
            fx.route("AUTH_HDSHK_INIT|abcdef"),
            Outcome::Rejected(Rejection::MalformedHandshake)
        );
        assert_eq!(
            fx.route("AUTH_HDSHK_INIT|abcdef&10:5"),
            Outcome::Rejected(Rejection::HandshakeFailed)
        );
        assert!(!fx.session.is_authenticated());
        assert_eq!(
            fx.replies.drain(),
            vec![
                "ERR_INVALID HANDSHAKE FORMAT",
                "ERR_INVALID HANDSHAKE FORMAT",
                "ERR_HANDSHAKE FAILED",
            ]
        );
    }

    #[test]
    fn test_invalid_counters_with_matching_hash() {
        let mut fx = Fixture::new();
        let short = derive_tag("hs", 10, 5, 0);
        assert_eq!(
            fx.route(&format!("AUTH_HDSHK_INIT|{}&10:5", short)),
            Outcome::Rejected(Rejection::InvalidAuthValues)
        );
        let zero = derive_tag("hs", 0, 5, 100);
        assert_eq!(
            fx.route(&format!("AUTH_HDSHK_INIT|{}&0:5:100", zero)),
            Outcome::Rejected(Rejection::InvalidAuthValues)
        );
        assert!(!fx.session.is_authenticated());
        assert_eq!(
            fx.replies.drain(),
            vec!["ERR_INVALID AUTH VALUES FORMAT", "ERR_INVALID AUTH VALUES FORMAT"]
        );
    }

    #[test]
    fn test_failed_handshake_leaves_session_untouched() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        fx.route("AUTH_HDSHK_INIT|00000000000000000000000000000000&20:2:300");
        assert!(fx.session.is_authenticated());
        assert_eq!((fx.session.init(), fx.session.step(), fx.session.limit()), (10, 5, 100));
    }

    #[test]
    fn test_other_auth_payload_is_ignored() {
        let mut fx = Fixture::new();
        assert_eq!(fx.route("AUTH_HELLO|x&1:1:1"), Outcome::Ignored);
        assert!(fx.replies.is_empty());
    }

    #[test]
    fn test_authenticated_command() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        fx.replies.drain();

        let tag = derive_tag("op", 10, 5, 100);
        let outcome = fx.route(&format!("CMD_ENABLE|{}", tag));
        assert_eq!(outcome, Outcome::Dispatched(Command::Enable));
        assert_eq!(fx.controller.state(), AccessState::Available);
        assert_eq!(fx.session.init(), 15);
        assert_eq!(fx.replies.drain(), vec!["ACK_RECEIVED ENABLE", "OK_ENABLE"]);
    }

    #[test]
    fn test_lowercase_command_dispatches() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        let tag = derive_tag("op", 10, 5, 100);
        assert_eq!(
            fx.route(&format!("CMD_enable|{}", tag)),
            Outcome::Dispatched(Command::Enable)
        );
        assert!(fx.controller.is_available());
    }

    #[test]
    fn test_unknown_command_is_silent() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        fx.replies.drain();

        let tag = derive_tag("op", 10, 5, 100);
        assert_eq!(fx.route(&format!("CMD_FOO|{}", tag)), Outcome::Ignored);
        assert!(fx.replies.is_empty());
        assert_eq!(fx.controller.state(), AccessState::Unavailable);
        // the tag was still consumed
        assert_eq!(fx.session.init(), 15);
    }

    #[test]
    fn test_wrong_tag_rejected() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        fx.replies.drain();

        assert_eq!(
            fx.route("CMD_ENABLE|00000000000000000000000000000000"),
            Outcome::Rejected(Rejection::TagMismatch)
        );
        assert_eq!(fx.route("CMD_ENABLE"), Outcome::Rejected(Rejection::TagMismatch));
        assert_eq!(fx.controller.state(), AccessState::Unavailable);
        assert_eq!(
            fx.replies.drain(),
            vec!["ERR_AUTHENTICATION FAILED", "ERR_AUTHENTICATION FAILED"]
        );
    }

    #[test]
    fn test_replay_rejected() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        let line = format!("CMD_PERMIT|{}", derive_tag("op", 10, 5, 100));
        assert_eq!(fx.route(&line), Outcome::Dispatched(Command::Permit));
        assert_eq!(fx.route(&line), Outcome::Rejected(Rejection::TagMismatch));
    }

    #[test]
    fn test_rehandshake_resets_session() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        fx.replies.drain();

        assert_eq!(
            fx.route("CMD_ENABLE|REHANDSHAKE"),
            Outcome::Rejected(Rejection::RehandshakeRequested)
        );
        assert!(!fx.session.is_authenticated());
        assert_eq!(fx.controller.state(), AccessState::Unavailable);
        assert_eq!(
            fx.replies.drain(),
            vec!["INFO_REHANDSHAKE REQUESTED", "ERR_AUTHENTICATION FAILED"]
        );

        let tag = derive_tag("op", 10, 5, 100);
        assert_eq!(
            fx.route(&format!("CMD_ENABLE|{}", tag)),
            Outcome::Rejected(Rejection::NotAuthenticated)
        );
    }

    #[test]
    fn test_non_command_kind_has_no_route() {
        let mut fx = Fixture::new();
        fx.handshake(10, 5, 100);
        fx.replies.drain();

        let tag = derive_tag("op", 10, 5, 100);
        assert_eq!(
            fx.route(&format!("INFO_hello|{}", tag)),
            Outcome::Rejected(Rejection::RouteNotFound)
        );
        assert_eq!(fx.replies.drain(), vec!["ERR_NOT FOUND ROUTE"]);
    }
}
