//! # popwatch-pop3
//!
//! An async POP3 client covering what a mailbox poller needs from
//! RFC 1939: greeting, USER/PASS, UIDL, RETR, DELE and QUIT.
//!
//! ## Features
//!
//! - **Explicit session states**: `Disconnected → Connected →
//!   Authenticated → Closed`, with typed errors for out-of-order calls
//! - **Terminator framing**: responses are accumulated until `CRLF` or
//!   `CRLF.CRLF`, however the bytes were split on the wire
//! - **Per-command timeouts** on connect, every read and every write
//! - **TLS via rustls**, optionally accepting unverifiable certificates
//! - **Sans-I/O parser** for status lines and UIDL listings
//!
//! ## Quick Start
//!
//! ```ignore
//! use popwatch_pop3::{Config, Security, Session};
//!
//! #[tokio::main]
//! async fn main() -> popwatch_pop3::Result<()> {
//!     let config = Config::builder("pop.example.com")
//!         .security(Security::Tls)
//!         .credentials("user@example.com", "password")
//!         .build();
//!
//!     let mut session = Session::new(config);
//!     session.connect().await?;
//!     session.login().await?;
//!
//!     for message in session.list_uids().await? {
//!         let raw = session.retrieve(message.index).await?;
//!         println!("{} ({} bytes)", message.uid, raw.len());
//!     }
//!
//!     session.quit().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Limitations
//!
//! Retrieved messages are returned exactly as sent: lines the server
//! dot-stuffed (a leading `.` doubled) are not un-stuffed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::Command;
pub use connection::{
    Config, ConfigBuilder, FramedStream, Pop3Stream, Security, Session, SessionState,
};
pub use error::{Error, ErrorKind, Result};
pub use parser::StatusLine;
pub use types::{MessageRef, Status};

/// Default POP3 port.
pub const POP3_PORT: u16 = 110;

/// Default POP3-over-TLS port.
pub const POP3S_PORT: u16 = 995;
