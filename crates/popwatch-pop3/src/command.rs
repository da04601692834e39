//! POP3 command builder.
//!
//! Every command goes out as a single `"<VERB> <args>\r\n"` write.

use std::fmt;

/// POP3 command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    // Authorization State Commands
    /// USER command.
    User(String),
    /// PASS command.
    Pass(String),

    // Transaction State Commands
    /// UIDL command (all messages).
    Uidl,
    /// RETR command.
    Retr(u32),
    /// DELE command.
    Dele(u32),

    // Any State Commands
    /// QUIT command.
    Quit,
}

impl Command {
    /// Returns the command verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::User(_) => "USER",
            Self::Pass(_) => "PASS",
            Self::Uidl => "UIDL",
            Self::Retr(_) => "RETR",
            Self::Dele(_) => "DELE",
            Self::Quit => "QUIT",
        }
    }

    /// Returns true if the server answers with a multi-line response.
    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        matches!(self, Self::Uidl | Self::Retr(_))
    }

    /// Serializes the command to wire format.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let line = match self {
            Self::User(arg) | Self::Pass(arg) => format!("{} {arg}\r\n", self.verb()),
            Self::Retr(index) | Self::Dele(index) => format!("{} {index}\r\n", self.verb()),
            Self::Uidl | Self::Quit => format!("{}\r\n", self.verb()),
        };
        line.into_bytes()
    }
}

/// Log-safe rendering; the PASS argument is never shown.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => write!(f, "USER {name}"),
            Self::Pass(_) => f.write_str("PASS <redacted>"),
            Self::Retr(index) | Self::Dele(index) => write!(f, "{} {index}", self.verb()),
            Self::Uidl | Self::Quit => f.write_str(self.verb()),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({self})")
    }
}
