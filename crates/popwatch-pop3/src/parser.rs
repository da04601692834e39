//! POP3 response parsing.
//!
//! Sans-I/O helpers: they take framed response text and never touch the
//! network.
//!
//! # Example
//!
//! ```
//! use popwatch_pop3::parser::{StatusLine, parse_uidl};
//! use popwatch_pop3::Status;
//!
//! let status = StatusLine::parse("-ERR no such message\r\n").unwrap();
//! assert_eq!(status.status, Status::Err);
//! assert_eq!(status.text, "no such message");
//!
//! let refs = parse_uidl("1 abc\r\n2 def\r\n");
//! assert_eq!(refs.len(), 2);
//! ```

use crate::types::{MessageRef, Status};
use crate::{Error, Result};

/// Parsed first line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// `+OK` or `-ERR`.
    pub status: Status,
    /// Text after the status token, surrounding whitespace removed.
    pub text: String,
}

impl StatusLine {
    /// Parses the status line at the start of `response`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the first line starts with neither
    /// `+OK` nor `-ERR`.
    pub fn parse(response: &str) -> Result<Self> {
        let line = response.lines().next().unwrap_or_default();

        let (status, rest) = if let Some(rest) = line.strip_prefix("+OK") {
            (Status::Ok, rest)
        } else if let Some(rest) = line.strip_prefix("-ERR") {
            (Status::Err, rest)
        } else {
            return Err(Error::Protocol(format!(
                "malformed status line: {:?}",
                line.trim_end()
            )));
        };

        Ok(Self {
            status,
            text: rest.trim().to_string(),
        })
    }

    /// Returns true for `+OK`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Converts `-ERR` into an error built by `on_err` from the reason
    /// text; `+OK` yields the status text.
    ///
    /// # Errors
    ///
    /// Whatever `on_err` builds, for `-ERR` responses.
    pub fn into_result(self, on_err: impl FnOnce(String) -> Error) -> Result<String> {
        match self.status {
            Status::Ok => Ok(self.text),
            Status::Err => Err(on_err(self.text)),
        }
    }
}

/// Parses a UIDL body into message references.
///
/// Each line is `"<index> <uid>"`. Lines without a positive integer
/// index and a non-empty uid are skipped. Server order is kept.
#[must_use]
pub fn parse_uidl(body: &str) -> Vec<MessageRef> {
    body.lines().filter_map(parse_uidl_line).collect()
}

fn parse_uidl_line(line: &str) -> Option<MessageRef> {
    let (index, uid) = line.split_once(' ')?;
    let index: u32 = index.parse().ok().filter(|&i| i > 0)?;
    let uid = uid.trim();
    if uid.is_empty() {
        return None;
    }
    Some(MessageRef::new(index, uid))
}

/// Removes the multi-line terminator from a framed body.
///
/// Handles both `"...\r\n.\r\n"` and the bare `".\r\n"` of an empty body.
#[must_use]
pub fn strip_terminator(body: &str) -> &str {
    body.strip_suffix("\r\n.\r\n")
        .or_else(|| body.strip_suffix(".\r\n").filter(|rest| rest.is_empty()))
        .unwrap_or(body)
}
