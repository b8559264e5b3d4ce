//! Line transport trait and line reassembly

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use rfid_core::AccessResult;

/// Longest line accepted before the partial line is discarded
pub const MAX_LINE_LENGTH: usize = 512;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Ordered, reliable line channel to the host
#[async_trait]
pub trait LineTransport: Send {
    /// Write one line; the terminator is appended by the transport
    async fn send_line(&mut self, line: &str) -> AccessResult<()>;

    /// Next complete line, if one is available
    ///
    /// Never waits longer than the transport's poll window. `Ok(None)` means
    /// nothing arrived in time.
    async fn poll_line(&mut self) -> AccessResult<Option<String>>;

    /// Check if the transport is closed
    fn is_closed(&self) -> bool;

    /// Close the transport
    async fn close(&mut self) -> AccessResult<()>;
}

/// Reassembles newline-terminated lines from arbitrary byte chunks
#[derive(Debug)]
pub struct LineBuffer {
    buffer: BytesMut,
    max_line: usize,
    discarding: bool,
}

impl LineBuffer {
    /// Create a new line buffer
    pub fn new() -> Self {
        Self::with_max_line(MAX_LINE_LENGTH)
    }

    /// Create a line buffer with a custom line length cap
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(128),
            max_line,
            discarding: false,
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if !self.buffer.contains(&b'\n') && self.buffer.len() > self.max_line {
            log::warn!(
                "Dropping {} bytes of an oversized line (limit {})",
                self.buffer.len(),
                self.max_line
            );
            self.buffer.clear();
            self.discarding = true;
        }
    }

    /// Take the next complete line
    ///
    /// Strips the terminator, a trailing `\r` and a leading UTF-8 BOM. Lines
    /// that are not valid UTF-8 or exceed the length cap are skipped.
    pub fn next_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut raw = self.buffer.split_to(pos + 1);
            raw.truncate(pos);

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if raw.last() == Some(&b'\r') {
                raw.truncate(raw.len() - 1);
            }
            if raw.starts_with(BOM) {
                raw.advance(BOM.len());
            }
            if raw.len() > self.max_line {
                log::warn!("Dropping oversized line of {} bytes", raw.len());
                continue;
            }

            match String::from_utf8(raw.to_vec()) {
                Ok(line) => return Some(line),
                Err(e) => log::warn!("Dropping line with invalid UTF-8: {}", e),
            }
        }
        None
    }

    /// Number of buffered bytes not yet returned as a line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
