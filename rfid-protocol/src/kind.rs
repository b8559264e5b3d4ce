//! Message kind vocabulary

use rfid_core::{AccessError, AccessResult};
use std::fmt;
use std::str::FromStr;

/// Kind prefix of a protocol line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Handshake / authentication
    Auth,
    /// Informational data
    Info,
    /// Error report
    Err,
    /// Acknowledgment
    Ack,
    /// Missing data warning
    Miss,
    /// Command to execute
    Cmd,
    /// Successful completion
    Ok,
}

impl MessageKind {
    /// All kinds, in wire order
    pub const ALL: [MessageKind; 7] = [
        MessageKind::Auth,
        MessageKind::Info,
        MessageKind::Err,
        MessageKind::Ack,
        MessageKind::Miss,
        MessageKind::Cmd,
        MessageKind::Ok,
    ];

    /// Wire prefix for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Auth => "AUTH",
            MessageKind::Info => "INFO",
            MessageKind::Err => "ERR",
            MessageKind::Ack => "ACK",
            MessageKind::Miss => "MISS",
            MessageKind::Cmd => "CMD",
            MessageKind::Ok => "OK",
        }
    }

    /// Match a wire prefix, case-sensitively
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "AUTH" => Some(MessageKind::Auth),
            "INFO" => Some(MessageKind::Info),
            "ERR" => Some(MessageKind::Err),
            "ACK" => Some(MessageKind::Ack),
            "MISS" => Some(MessageKind::Miss),
            "CMD" => Some(MessageKind::Cmd),
            "OK" => Some(MessageKind::Ok),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = AccessError;

    fn from_str(s: &str) -> AccessResult<Self> {
        Self::from_prefix(s)
            .ok_or_else(|| AccessError::FrameInvalid(format!("Unknown message kind: {}", s)))
    }
}
