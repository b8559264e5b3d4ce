use thiserror::Error;

/// Main error type for the access node
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Frame invalid: {0}")]
    FrameInvalid(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport closed")]
    Closed,
}

impl AccessError {
    /// Whether the error means the link is gone for good
    pub fn is_fatal(&self) -> bool {
        matches!(self, AccessError::Closed)
    }
}

/// Result type alias for access node operations
pub type AccessResult<T> = Result<T, AccessError>;
