//! Error types for local-chat

use thiserror::Error;

/// The main error type for local-chat operations
#[derive(Error, Debug)]
pub enum Error {
    /// The completion service could not be reached, answered with a
    /// non-success status, or did not answer before the deadline
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The completion service answered successfully but the payload was
    /// not what the chat protocol promises
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// The persisted conversation document could not be decoded
    #[error("Corrupt state: {0}")]
    CorruptState(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A command arrived while the session was not ready for it
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// A specialized Result type for local-chat operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Whether the error came from talking to the completion service
    pub fn is_completion_failure(&self) -> bool {
        matches!(self, Error::ServiceUnavailable(_) | Error::Protocol(_))
    }
}
