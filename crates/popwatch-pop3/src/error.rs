//! Error types for the POP3 library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during POP3 operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not establish the connection (DNS, refusal, TLS handshake or
    /// connect timeout).
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Server sent a bad greeting or a malformed status line.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server rejected USER or PASS.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server returned `-ERR` for a transaction command.
    #[error("Server returned -ERR: {0}")]
    Command(String),

    /// No complete response arrived in time.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Socket error or connection closed mid-command.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Operation is not valid in the current session state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Connect`].
    Connect,
    /// See [`Error::Protocol`].
    Protocol,
    /// See [`Error::Auth`].
    Auth,
    /// See [`Error::Command`].
    Command,
    /// See [`Error::Timeout`].
    Timeout,
    /// See [`Error::Transport`].
    Transport,
    /// See [`Error::InvalidState`].
    InvalidState,
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect(_) => ErrorKind::Connect,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Command(_) => ErrorKind::Command,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
