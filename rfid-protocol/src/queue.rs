//! Outgoing reply queue

use crate::frame::Frame;
use crate::kind::MessageKind;
use std::collections::VecDeque;

/// FIFO of encoded reply lines waiting for the transport
///
/// The router and the access controller push replies here while a frame is
/// being dispatched; the node drains it to the transport afterwards.
#[derive(Debug, Default)]
pub struct ReplyQueue {
    queue: VecDeque<String>,
}

impl ReplyQueue {
    /// Create a new reply queue
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Queue an untagged reply
    pub fn push(&mut self, kind: MessageKind, payload: &str) {
        self.queue.push_back(Frame::encode(kind, payload));
    }

    /// Queue `OK_<payload>`
    pub fn ok(&mut self, payload: &str) {
        self.push(MessageKind::Ok, payload);
    }

    /// Queue `ERR_<payload>`
    pub fn err(&mut self, payload: &str) {
        self.push(MessageKind::Err, payload);
    }

    /// Queue `ACK_<payload>`
    pub fn ack(&mut self, payload: &str) {
        self.push(MessageKind::Ack, payload);
    }

    /// Queue `INFO_<payload>`
    pub fn info(&mut self, payload: &str) {
        self.push(MessageKind::Info, payload);
    }

    /// Remove and return the next line
    pub fn dequeue(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Take every queued line in order
    pub fn drain(&mut self) -> Vec<String> {
        self.queue.drain(..).collect()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
