//! Hardware seam: card reader, indicators and the arm button

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Output channel driven by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Node is not accepting cards (red)
    Idle,
    /// Node is armed for one card read (yellow)
    Armed,
    /// Access granted signal (green)
    Granted,
    /// Host session is authenticated (blue)
    Session,
    /// Buzzer / deny sounder
    Buzzer,
}

/// Physical inputs and outputs of the node
///
/// All calls are non-blocking polls or writes.
#[cfg_attr(test, mockall::automock)]
pub trait Hardware: Send {
    /// UID of a newly presented card, if one is in the field
    fn read_card_uid(&mut self) -> Option<Vec<u8>>;

    /// Drive an output channel
    fn set_indicator(&mut self, channel: Channel, on: bool);

    /// Whether the arm button was pressed since the last poll
    fn read_button_edge(&mut self) -> bool;
}

#[derive(Debug, Default)]
struct SimulatedState {
    levels: HashMap<Channel, bool>,
    history: Vec<(Channel, bool)>,
    cards: VecDeque<Vec<u8>>,
    button_edges: usize,
}

/// In-memory hardware
///
/// Clones share the same state, so one handle can be given to the node while
/// another injects cards and button presses.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHardware {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a card for the next reader poll
    pub fn present_card(&self, uid: &[u8]) {
        self.lock().cards.push_back(uid.to_vec());
    }

    /// Register one button press
    pub fn press_button(&self) {
        self.lock().button_edges += 1;
    }

    /// Current level of a channel (off if never driven)
    pub fn indicator(&self, channel: Channel) -> bool {
        self.lock().levels.get(&channel).copied().unwrap_or(false)
    }

    /// Every write made so far, oldest first
    pub fn history(&self) -> Vec<(Channel, bool)> {
        self.lock().history.clone()
    }

    /// Cards presented but not yet read
    pub fn pending_cards(&self) -> usize {
        self.lock().cards.len()
    }
}

impl Hardware for SimulatedHardware {
    fn read_card_uid(&mut self) -> Option<Vec<u8>> {
        self.lock().cards.pop_front()
    }

    fn set_indicator(&mut self, channel: Channel, on: bool) {
        let mut state = self.lock();
        let previous = state.levels.insert(channel, on);
        if previous != Some(on) {
            log::debug!("Indicator {:?} -> {}", channel, if on { "on" } else { "off" });
        }
        state.history.push((channel, on));
    }

    fn read_button_edge(&mut self) -> bool {
        let mut state = self.lock();
        if state.button_edges > 0 {
            state.button_edges -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_inputs() {
        let handle = SimulatedHardware::new();
        let mut hardware = handle.clone();

        assert_eq!(hardware.read_card_uid(), None);
        handle.present_card(&[0xDE, 0xAD]);
        assert_eq!(handle.pending_cards(), 1);
        assert_eq!(hardware.read_card_uid(), Some(vec![0xDE, 0xAD]));

        assert!(!hardware.read_button_edge());
        handle.press_button();
        assert!(hardware.read_button_edge());
        assert!(!hardware.read_button_edge());
    }

    #[test]
    fn test_simulated_outputs() {
        let handle = SimulatedHardware::new();
        let mut hardware = handle.clone();

        assert!(!handle.indicator(Channel::Idle));
        hardware.set_indicator(Channel::Idle, true);
        hardware.set_indicator(Channel::Buzzer, false);
        assert!(handle.indicator(Channel::Idle));
        assert_eq!(
            handle.history(),
            vec![(Channel::Idle, true), (Channel::Buzzer, false)]
        );
    }
}
