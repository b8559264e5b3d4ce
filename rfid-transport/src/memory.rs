//! In-memory line transport
//!
//! Connects a node to a [`MemoryPeer`] through unbounded channels. Used by
//! tests and by host simulations that drive the node without a serial port.

use crate::line::{LineBuffer, LineTransport};
use async_trait::async_trait;
use rfid_core::{AccessError, AccessResult};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Node end of an in-memory link
#[derive(Debug)]
pub struct MemoryTransport {
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound: mpsc::UnboundedSender<String>,
    buffer: LineBuffer,
    closed: bool,
}

/// Host end of an in-memory link
#[derive(Debug)]
pub struct MemoryPeer {
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl MemoryTransport {
    /// Create a connected transport/peer pair
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let transport = MemoryTransport {
            inbound: inbound_rx,
            outbound: outbound_tx,
            buffer: LineBuffer::new(),
            closed: false,
        };
        let peer = MemoryPeer {
            inbound: inbound_tx,
            outbound: outbound_rx,
        };
        (transport, peer)
    }
}

#[async_trait]
impl LineTransport for MemoryTransport {
    async fn send_line(&mut self, line: &str) -> AccessResult<()> {
        if self.closed {
            return Err(AccessError::Closed);
        }
        self.outbound
            .send(line.to_string())
            .map_err(|_| AccessError::Closed)
    }

    async fn poll_line(&mut self) -> AccessResult<Option<String>> {
        loop {
            if let Some(line) = self.buffer.next_line() {
                return Ok(Some(line));
            }
            match self.inbound.try_recv() {
                Ok(chunk) => self.buffer.extend(&chunk),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    return Err(AccessError::Closed);
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> AccessResult<()> {
        self.inbound.close();
        self.closed = true;
        Ok(())
    }
}

impl MemoryPeer {
    /// Send one line to the node
    pub fn send_line(&self, line: &str) -> AccessResult<()> {
        self.send_bytes(format!("{}\n", line).as_bytes())
    }

    /// Send raw bytes to the node, possibly a partial line
    pub fn send_bytes(&self, bytes: &[u8]) -> AccessResult<()> {
        self.inbound
            .send(bytes.to_vec())
            .map_err(|_| AccessError::Closed)
    }

    /// Next line written by the node, if any
    pub fn try_recv(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Wait for the next line written by the node
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Every line the node has written so far
    pub fn drain(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.try_recv() {
            lines.push(line);
        }
        lines
    }
}
