//! Error types for the HIL bridge

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Bridge error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Framing or arity violation on either link
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The run ended because a worker hit a fatal condition
    #[error("bridge stopped after a fault")]
    Faulted,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
