//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// POP3 operation failed.
    #[error("POP3 error: {0}")]
    Pop3(#[from] popwatch_pop3::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Emitted records could not be handed over.
    #[error("Sink error: {0}")]
    Sink(String),
}

impl Error {
    /// Returns the POP3 error kind, if this error came from the session.
    #[must_use]
    pub const fn pop3_kind(&self) -> Option<popwatch_pop3::ErrorKind> {
        match self {
            Self::Pop3(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
