//! Wire protocol for the RFID access node
//!
//! Every message is a single text line:
//!
//! ```text
//! <KIND>_<payload>[|<tag>]
//! ```
//!
//! `KIND` is one of `AUTH, INFO, ERR, ACK, MISS, CMD, OK`. The optional tag
//! carries either a rolling authentication hash or, for the handshake, a
//! `hash&init:step:limit` pair. Replies produced by the node never carry a
//! tag.

pub mod kind;
pub mod frame;
pub mod queue;

pub use frame::{checksum, Frame, CHECKSUM_SEPARATOR, KIND_SEPARATOR, TAG_SEPARATOR};
pub use kind::MessageKind;
pub use queue::ReplyQueue;
