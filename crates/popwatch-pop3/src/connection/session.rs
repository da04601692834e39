//! POP3 session state machine.
//!
//! A [`Session`] walks through `Disconnected → Connected → Authenticated →
//! Closed`. The live stream is owned by the `Connected` and
//! `Authenticated` states, so there is no socket to misuse once a session
//! is closed, and every method takes `&mut self`, which rules out a second
//! command being issued while one is in flight.
//!
//! ## Example
//!
//! ```ignore
//! use popwatch_pop3::{Config, Security, Session};
//!
//! let config = Config::builder("pop.example.com")
//!     .security(Security::Tls)
//!     .credentials("user@example.com", "password")
//!     .build();
//!
//! let mut session = Session::new(config);
//! session.connect().await?;
//! session.login().await?;
//!
//! for message in session.list_uids().await? {
//!     let raw = session.retrieve(message.index).await?;
//!     println!("{}: {} bytes", message.uid, raw.len());
//! }
//!
//! session.quit().await;
//! ```

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use super::config::Config;
use super::framed::FramedStream;
use super::stream::{Pop3Stream, connect};
use crate::command::Command;
use crate::parser::{StatusLine, parse_uidl, strip_terminator};
use crate::types::MessageRef;
use crate::{Error, Result};

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection yet.
    Disconnected,
    /// Greeting received, not logged in.
    Connected,
    /// USER/PASS accepted.
    Authenticated,
    /// QUIT issued and socket released. Terminal.
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Internal state, owning the stream while one exists.
enum Phase<S> {
    Disconnected,
    Connected(FramedStream<S>),
    Authenticated(FramedStream<S>),
    Closed,
}

/// A single POP3 session.
///
/// Created per poll cycle and never reused once closed.
pub struct Session<S = Pop3Stream> {
    config: Config,
    phase: Phase<S>,
}

impl<S> Session<S> {
    /// Creates a disconnected session.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            phase: Phase::Disconnected,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        match self.phase {
            Phase::Disconnected => SessionState::Disconnected,
            Phase::Connected(_) => SessionState::Connected,
            Phase::Authenticated(_) => SessionState::Authenticated,
            Phase::Closed => SessionState::Closed,
        }
    }

    /// Returns the connection parameters.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

impl Session<Pop3Stream> {
    /// Opens the network connection and reads the greeting.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] if the connection cannot be established,
    /// [`Error::Protocol`] if the greeting is not `+OK`, or any read error.
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(SessionState::Disconnected, "connect")?;
        let stream = connect(&self.config).await?;
        self.open(stream).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting on an already-connected stream.
    ///
    /// On a non-`+OK` greeting the stream is dropped and the session
    /// stays disconnected; callers should abandon it.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] for a rejected or malformed greeting, plus any
    /// read error.
    pub async fn open(&mut self, stream: S) -> Result<()> {
        self.expect_state(SessionState::Disconnected, "open")?;

        let mut framed = FramedStream::new(stream, self.config.timeout);
        let greeting = StatusLine::parse(&framed.read_line().await?)?;
        if !greeting.is_ok() {
            return Err(Error::Protocol(format!(
                "server rejected connection: {}",
                greeting.text
            )));
        }

        debug!(host = %self.config.host, greeting = %greeting.text, "Connected");
        self.phase = Phase::Connected(framed);
        Ok(())
    }

    /// Authenticates with USER and PASS.
    ///
    /// PASS is not sent if USER is rejected.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] carrying the server's reason if either command is
    /// rejected.
    pub async fn login(&mut self) -> Result<()> {
        let state = self.state();
        let Phase::Connected(stream) = &mut self.phase else {
            return Err(invalid_state("login", state));
        };

        let user = Command::User(self.config.username.clone());
        exchange(stream, &user).await?.into_result(Error::Auth)?;

        let pass = Command::Pass(self.config.password.clone());
        exchange(stream, &pass).await?.into_result(Error::Auth)?;

        if let Phase::Connected(stream) = std::mem::replace(&mut self.phase, Phase::Closed) {
            self.phase = Phase::Authenticated(stream);
        }
        debug!(user = %self.config.username, "Authenticated");
        Ok(())
    }

    /// Lists every message with its unique identifier, in server order.
    ///
    /// # Errors
    ///
    /// [`Error::Command`] if the server answers `-ERR`.
    pub async fn list_uids(&mut self) -> Result<Vec<MessageRef>> {
        let body = self.transact(&Command::Uidl).await?;
        let refs = parse_uidl(&body);
        debug!(count = refs.len(), "Listed messages");
        Ok(refs)
    }

    /// Retrieves the raw text of message `index`.
    ///
    /// The final terminator is stripped. Dot-stuffed lines (a leading `.`
    /// doubled by the server) are returned as sent, not un-stuffed.
    ///
    /// # Errors
    ///
    /// [`Error::Command`] if the server answers `-ERR`.
    pub async fn retrieve(&mut self, index: u32) -> Result<String> {
        self.transact(&Command::Retr(index)).await
    }

    /// Marks message `index` for deletion.
    ///
    /// # Errors
    ///
    /// [`Error::Command`] if the server answers `-ERR`.
    pub async fn delete(&mut self, index: u32) -> Result<()> {
        self.transact(&Command::Dele(index)).await?;
        Ok(())
    }

    /// Sends QUIT and releases the connection.
    ///
    /// Best effort: the QUIT outcome is ignored and the session always
    /// ends up closed, whatever state it was in.
    pub async fn quit(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Connected(mut stream) | Phase::Authenticated(mut stream) => {
                if let Err(e) = exchange(&mut stream, &Command::Quit).await {
                    warn!(error = %e, "QUIT failed; closing anyway");
                }
                stream.shutdown().await;
                debug!("Connection closed");
            }
            Phase::Disconnected | Phase::Closed => {}
        }
    }

    /// Runs a transaction-state command.
    ///
    /// Returns the body of a multi-line response, or the status text of a
    /// single-line one.
    async fn transact(&mut self, command: &Command) -> Result<String> {
        let state = self.state();
        let Phase::Authenticated(stream) = &mut self.phase else {
            return Err(invalid_state(command.verb(), state));
        };

        // A -ERR reply is a single line with no body to wait for
        let text = exchange(stream, command)
            .await?
            .into_result(Error::Command)?;
        if !command.is_multiline() {
            return Ok(text);
        }
        let body = stream.read_body().await?;
        Ok(strip_terminator(&body).to_string())
    }

    fn expect_state(&self, expected: SessionState, operation: &str) -> Result<()> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(invalid_state(operation, state))
        }
    }
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Sends one command and reads its status line.
async fn exchange<S>(stream: &mut FramedStream<S>, command: &Command) -> Result<StatusLine>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!(%command, "Sending");
    stream.write(&command.serialize()).await?;
    let line = stream.read_line().await?;
    StatusLine::parse(&line)
}

fn invalid_state(operation: &str, state: SessionState) -> Error {
    Error::InvalidState(format!("cannot {operation} while {state}"))
}
