//! POP3 connection management.
//!
//! This module provides connection handling for POP3 servers, including:
//! - Configuration (host, port, security mode, credentials, timeout)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for POP3 responses
//! - The session state machine

mod config;
mod framed;
mod session;
mod stream;

pub use config::{Config, ConfigBuilder, Security};
pub use framed::{FramedStream, LINE_TERMINATOR, MULTILINE_TERMINATOR};
pub use session::{Session, SessionState};
pub use stream::{Pop3Stream, connect, create_tls_connector};
