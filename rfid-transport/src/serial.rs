//! Serial port line transport

use crate::line::{LineBuffer, LineTransport};
use async_trait::async_trait;
use rfid_core::{AccessError, AccessResult};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialStream;

/// Wrapper for SerialStream that implements Debug
struct DebugSerialStream(SerialStream);

impl fmt::Debug for DebugSerialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialStream").finish()
    }
}

impl Deref for DebugSerialStream {
    type Target = SerialStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugSerialStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Serial port transport settings
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    /// Longest a single `poll_line` waits for bytes
    pub poll_window: Duration,
}

impl SerialSettings {
    /// Default line speed of the node
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// Create 8N1 settings without flow control
    pub fn new(port_name: String, baud_rate: u32) -> Self {
        Self {
            port_name,
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            poll_window: Duration::from_millis(10),
        }
    }

    /// Create settings with a custom poll window
    pub fn with_poll_window(port_name: String, baud_rate: u32, poll_window: Duration) -> Self {
        Self {
            poll_window,
            ..Self::new(port_name, baud_rate)
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::new("/dev/ttyACM0".to_string(), Self::DEFAULT_BAUD_RATE)
    }
}

/// Serial port line transport
#[derive(Debug)]
pub struct SerialLineTransport {
    stream: Option<DebugSerialStream>,
    settings: SerialSettings,
    buffer: LineBuffer,
    closed: bool,
}

impl SerialLineTransport {
    /// Create a new, not yet opened, serial transport
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
            buffer: LineBuffer::new(),
            closed: true,
        }
    }

    /// Open the serial port
    pub fn open(&mut self) -> AccessResult<()> {
        if !self.closed {
            return Err(AccessError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Serial port has already been opened",
            )));
        }

        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control);

        let stream = SerialStream::open(&builder).map_err(|e| {
            AccessError::Connection(std::io::Error::other(format!(
                "Failed to open serial port {}: {}",
                self.settings.port_name, e
            )))
        })?;

        log::info!(
            "Opened serial port {} at {} bps",
            self.settings.port_name,
            self.settings.baud_rate
        );
        self.stream = Some(DebugSerialStream(stream));
        self.closed = false;
        Ok(())
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> AccessResult<&mut DebugSerialStream> {
        self.stream.as_mut().ok_or_else(|| {
            AccessError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Serial stream not connected",
            ))
        })
    }
}

#[async_trait]
impl LineTransport for SerialLineTransport {
    async fn send_line(&mut self, line: &str) -> AccessResult<()> {
        let stream = self.stream_mut()?;
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;
        Ok(())
    }

    async fn poll_line(&mut self) -> AccessResult<Option<String>> {
        if let Some(line) = self.buffer.next_line() {
            return Ok(Some(line));
        }

        let window = self.settings.poll_window;
        let mut chunk = [0u8; 64];
        let stream = self.stream_mut()?;

        let read = match tokio::time::timeout(window, stream.read(&mut chunk)).await {
            Ok(read) => read,
            Err(_) => return Ok(None),
        };

        match read {
            Ok(0) => {
                self.closed = true;
                Err(AccessError::Closed)
            }
            Ok(n) => {
                self.buffer.extend(&chunk[..n]);
                Ok(self.buffer.next_line())
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => {
                self.closed = true;
                Err(AccessError::Connection(e))
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> AccessResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush().await {
                log::warn!("Failed to flush {} on close: {}", self.settings.port_name, e);
            }
        }
        self.closed = true;
        Ok(())
    }
}
