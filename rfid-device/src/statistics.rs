//! Node statistics collection

use crate::router::{Outcome, Rejection};

/// Counters kept by the control loop
///
/// Updated by [`Node`](crate::node::Node) on every line and reply; useful
/// for spotting a host that has fallen out of step with the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStatistics {
    /// Lines read from the host
    pub lines_received: u64,
    /// Reply lines written to the host
    pub lines_sent: u64,
    /// Lines that did not decode as a frame
    pub decode_errors: u64,
    /// Accepted handshakes
    pub handshakes: u64,
    /// Authenticated commands executed
    pub commands_dispatched: u64,
    /// Frames refused by the router
    pub frames_rejected: u64,
    /// Rehandshake requests from the host
    pub rehandshakes: u64,
    /// Non-fatal transport failures
    pub transport_errors: u64,
}

impl NodeStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_lines_received(&mut self) {
        self.lines_received += 1;
    }

    pub fn increment_lines_sent(&mut self) {
        self.lines_sent += 1;
    }

    pub fn increment_decode_errors(&mut self) {
        self.decode_errors += 1;
    }

    pub fn increment_transport_errors(&mut self) {
        self.transport_errors += 1;
    }

    /// Account for the result of one routed frame
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::HandshakeAccepted(_) => self.handshakes += 1,
            Outcome::Dispatched(_) => self.commands_dispatched += 1,
            Outcome::Rejected(rejection) => {
                self.frames_rejected += 1;
                if *rejection == Rejection::RehandshakeRequested {
                    self.rehandshakes += 1;
                }
            }
            Outcome::Ignored => {}
        }
    }

    /// Share of received lines that were refused or undecodable, in percent
    ///
    /// Returns 0.0 if nothing has been received.
    pub fn error_rate(&self) -> f64 {
        if self.lines_received == 0 {
            0.0
        } else {
            ((self.decode_errors + self.frames_rejected) as f64 / self.lines_received as f64) * 100.0
        }
    }
}
