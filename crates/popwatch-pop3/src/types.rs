//! Core POP3 types.

use std::fmt;

/// A message as listed by UIDL.
///
/// `index` is only meaningful inside the session that produced it, since
/// servers may renumber messages between sessions. `uid` is the durable
/// identifier and is treated as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    /// Session-local message number (always positive).
    pub index: u32,
    /// Server-assigned unique identifier.
    pub uid: String,
}

impl MessageRef {
    /// Creates a new message reference.
    #[must_use]
    pub fn new(index: u32, uid: impl Into<String>) -> Self {
        Self {
            index,
            uid: uid.into(),
        }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.index, self.uid)
    }
}

/// Status indicator on the first line of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `+OK`
    Ok,
    /// `-ERR`
    Err,
}
