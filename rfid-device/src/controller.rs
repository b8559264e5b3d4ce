//! Physical access state machine
//!
//! # State Transitions
//! ```text
//! Unavailable -> Available   (ENABLE, button)
//! Available -> Unavailable   (DISABLE, button, card read)
//! ```
//!
//! An armed node accepts exactly one card: reporting it disarms the node.
//! Permit / deny signals are independent of the armed state, and so is the
//! session indicator, which mirrors whether the host session is
//! authenticated.
//!
//! The granted light and the buzzer are pulses: they switch off again after
//! [`PULSE_POLLS`] input polls.

use crate::hardware::{Channel, Hardware};
use rfid_protocol::ReplyQueue;
use sha2::{Digest, Sha256};
use std::fmt;

/// Whether the node accepts a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessState {
    /// Not armed (initial state)
    #[default]
    Unavailable,
    /// Armed for a single card read
    Available,
}

impl AccessState {
    /// The other state
    pub fn toggled(&self) -> Self {
        match self {
            AccessState::Unavailable => AccessState::Available,
            AccessState::Available => AccessState::Unavailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessState::Unavailable => "Unavailable",
            AccessState::Available => "Available",
        }
    }
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last access decision signalled to the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Permit,
    Deny,
    SoundDeny,
}

/// Input polls a granted / buzzer pulse stays on (about one second at the
/// default loop interval)
pub const PULSE_POLLS: u32 = 4;

/// Hash reported for a card: SHA-256 over the upper-case hex UID text
pub fn card_hash(uid: &[u8]) -> String {
    let uid_text = hex::encode_upper(uid);
    hex::encode_upper(Sha256::digest(uid_text.as_bytes()))
}

/// Access controller driving the node hardware
#[derive(Debug)]
pub struct AccessController<H: Hardware> {
    hardware: H,
    state: AccessState,
    signal: Option<Signal>,
    session_active: bool,
    pulse_remaining: u32,
}

impl<H: Hardware> AccessController<H> {
    /// Create a controller in the `Unavailable` state and drive the outputs
    pub fn new(hardware: H) -> Self {
        let mut controller = Self {
            hardware,
            state: AccessState::Unavailable,
            signal: None,
            session_active: false,
            pulse_remaining: 0,
        };
        controller.refresh_outputs(false);
        controller
    }

    /// Arm the node
    pub fn enable(&mut self, replies: &mut ReplyQueue) {
        self.set_state(AccessState::Available);
        replies.ok("ENABLE");
    }

    /// Disarm the node
    pub fn disable(&mut self, replies: &mut ReplyQueue) {
        self.set_state(AccessState::Unavailable);
        replies.ok("DISABLE");
    }

    /// Flip between armed and disarmed (button press)
    pub fn toggle(&mut self) {
        let next = self.state.toggled();
        log::info!("Button pressed, {} -> {}", self.state, next);
        self.set_state(next);
    }

    /// Report a card and disarm
    ///
    /// Ignored unless the node is armed.
    pub fn handle_card(&mut self, uid: &[u8], replies: &mut ReplyQueue) {
        if self.state != AccessState::Available {
            log::debug!("Card presented while {}, ignoring", self.state);
            return;
        }

        self.pulse(true, false);
        let hash = card_hash(uid);
        log::info!("Card read, reporting hash");
        replies.ok(&hash);
        self.set_state(AccessState::Unavailable);
    }

    /// Signal access granted
    pub fn permit(&mut self, replies: &mut ReplyQueue) {
        self.signal(Signal::Permit);
        replies.ok("PERMIT");
    }

    /// Signal access denied, silently
    pub fn deny(&mut self, replies: &mut ReplyQueue) {
        self.signal(Signal::Deny);
        replies.ok("DENY");
    }

    /// Signal access denied with the buzzer
    pub fn sound_deny(&mut self, replies: &mut ReplyQueue) {
        self.signal(Signal::SoundDeny);
        replies.ok("SOUND_DENY");
    }

    fn signal(&mut self, signal: Signal) {
        self.pulse(signal == Signal::Permit, signal == Signal::SoundDeny);
        self.signal = Some(signal);
    }

    fn pulse(&mut self, granted: bool, buzzer: bool) {
        self.hardware.set_indicator(Channel::Granted, granted);
        self.hardware.set_indicator(Channel::Buzzer, buzzer);
        self.pulse_remaining = if granted || buzzer { PULSE_POLLS } else { 0 };
    }

    /// Count down a running pulse, switching it off when it expires
    fn expire_pulse(&mut self) {
        if self.pulse_remaining == 0 {
            return;
        }
        self.pulse_remaining -= 1;
        if self.pulse_remaining == 0 {
            self.hardware.set_indicator(Channel::Granted, false);
            self.hardware.set_indicator(Channel::Buzzer, false);
        }
    }

    fn set_state(&mut self, state: AccessState) {
        self.state = state;
        let session_active = self.session_active;
        self.refresh_outputs(session_active);
    }

    /// Drive the armed and session indicators from the current state
    pub fn refresh_outputs(&mut self, session_active: bool) {
        let armed = self.state == AccessState::Available;
        self.hardware.set_indicator(Channel::Idle, !armed);
        self.hardware.set_indicator(Channel::Armed, armed);
        self.hardware.set_indicator(Channel::Session, session_active);
        self.session_active = session_active;
    }

    /// One poll of the physical inputs, then an output refresh
    pub fn poll_inputs(&mut self, session_active: bool, replies: &mut ReplyQueue) {
        self.session_active = session_active;
        self.expire_pulse();

        if self.hardware.read_button_edge() {
            self.toggle();
        }

        if self.state == AccessState::Available {
            if let Some(uid) = self.hardware.read_card_uid() {
                self.handle_card(&uid, replies);
            }
        }

        self.refresh_outputs(session_active);
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == AccessState::Available
    }

    /// Last permit / deny signal, if any
    pub fn last_signal(&self) -> Option<Signal> {
        self.signal
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }
}
