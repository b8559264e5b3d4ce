//! Node control loop
//!
//! One task owns the session, the access controller, the reply queue and the
//! host link. Every iteration:
//! 1. Reads at most one line from the host and routes it
//! 2. Polls the button and the card reader
//! 3. Writes all queued replies back to the host
//!
//! Protocol rejections become replies; only a closed transport ends the loop.

use crate::config::NodeConfig;
use crate::controller::AccessController;
use crate::hardware::Hardware;
use crate::router::{Outcome, Router};
use crate::statistics::NodeStatistics;
use rfid_core::{AccessError, AccessResult};
use rfid_protocol::{Frame, ReplyQueue};
use rfid_security::{SecretDerivation, SessionState};
use rfid_transport::LineTransport;
use std::time::Duration;

/// RFID access node
pub struct Node<T: LineTransport, H: Hardware> {
    transport: T,
    session: SessionState,
    controller: AccessController<H>,
    replies: ReplyQueue,
    poll_interval: Duration,
    statistics: NodeStatistics,
}

impl<T: LineTransport, H: Hardware> Node<T, H> {
    /// Create a node with the given secrets and the default loop interval
    pub fn new(transport: T, hardware: H, secrets: SecretDerivation) -> Self {
        Self {
            transport,
            session: SessionState::new(secrets),
            controller: AccessController::new(hardware),
            replies: ReplyQueue::new(),
            poll_interval: NodeConfig::DEFAULT_POLL_INTERVAL,
            statistics: NodeStatistics::new(),
        }
    }

    /// Create a node from a full configuration
    pub fn with_config(transport: T, hardware: H, config: &NodeConfig) -> Self {
        let mut node = Self::new(transport, hardware, config.secrets.clone());
        node.poll_interval = config.poll_interval;
        node
    }

    /// Run one control loop iteration
    ///
    /// # Errors
    /// Returns [`AccessError::Closed`] once the host link is gone; all other
    /// failures are logged and absorbed.
    pub async fn tick(&mut self) -> AccessResult<()> {
        match self.transport.poll_line().await {
            Ok(Some(line)) => self.handle_line(&line),
            Ok(None) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Failed to read from host: {}", e);
                self.statistics.increment_transport_errors();
            }
        }

        let session_active = self.session.is_authenticated();
        self.controller.poll_inputs(session_active, &mut self.replies);

        self.flush().await
    }

    /// Loop until the host link closes
    pub async fn run(&mut self) -> AccessResult<()> {
        log::info!("Node control loop started, interval {:?}", self.poll_interval);

        while !self.transport.is_closed() {
            match self.tick().await {
                Ok(()) => {}
                Err(AccessError::Closed) => break,
                Err(e) => log::error!("Control loop iteration failed: {}", e),
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        log::info!("Host link closed, node stopping");
        Ok(())
    }

    /// Decode and route one line from the host
    pub fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.statistics.increment_lines_received();

        let Some(frame) = Frame::decode(line) else {
            log::warn!("Undecodable line from host: {:?}", line);
            self.statistics.increment_decode_errors();
            self.replies.err("INVALID PROTOCOL MESSAGE");
            return;
        };

        let outcome = Router::new(&mut self.session, &mut self.controller)
            .route(&frame, &mut self.replies);
        if let Outcome::Dispatched(command) = outcome {
            log::debug!("Executed {}", command);
        }
        self.statistics.record(&outcome);
    }

    /// Write every queued reply to the host
    async fn flush(&mut self) -> AccessResult<()> {
        while let Some(reply) = self.replies.dequeue() {
            match self.transport.send_line(&reply).await {
                Ok(()) => self.statistics.increment_lines_sent(),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("Failed to send reply {:?}: {}", reply, e);
                    self.statistics.increment_transport_errors();
                }
            }
        }
        Ok(())
    }

    /// Close the host link
    pub async fn shutdown(&mut self) -> AccessResult<()> {
        self.transport.close().await
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn controller(&self) -> &AccessController<H> {
        &self.controller
    }

    pub fn statistics(&self) -> &NodeStatistics {
        &self.statistics
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
