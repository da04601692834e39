//! Poller configuration model.

use std::fmt;
use std::time::Duration;

use popwatch_pop3::{Config, Security};
use serde::{Deserialize, Serialize};

/// Default command timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default maximum number of messages emitted per cycle.
pub const DEFAULT_LIMIT: usize = 10;

/// Everything one mailbox poller needs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Key of the persisted known-UID state. Defaults to
    /// `username@host:port`.
    pub mailbox: Option<String>,
    /// Server hostname.
    pub host: String,
    /// Server port (default: 995 with TLS, 110 without).
    pub port: Option<u16>,
    /// Connect over TLS.
    pub secure: bool,
    /// Accept certificates that fail verification.
    pub allow_unauthorized_certs: bool,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
    /// Bound on connect and on each command, in seconds.
    pub timeout_secs: u64,
    /// Seconds between poll cycles (minimum 10).
    pub poll_interval_secs: u64,
    /// Maximum messages emitted per cycle (1-50).
    pub limit: usize,
    /// On the very first cycle, emit what is already in the mailbox
    /// instead of only recording it as known.
    pub emit_on_start: bool,
    /// Delete each message from the server once it has been emitted.
    pub delete_after_emit: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            mailbox: None,
            host: String::new(),
            port: None,
            secure: true,
            allow_unauthorized_certs: false,
            username: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            limit: DEFAULT_LIMIT,
            emit_on_start: false,
            delete_after_emit: false,
        }
    }
}

impl PollerConfig {
    /// Creates a configuration for the given server and credentials.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or has wrongly typed fields.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the security mode.
    #[must_use]
    pub const fn security(&self) -> Security {
        Security::from_secure(self.secure)
    }

    /// Returns the configured port or the default for the security mode.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security().default_port())
    }

    /// Returns the persisted-state key for this mailbox.
    #[must_use]
    pub fn mailbox_key(&self) -> String {
        self.mailbox
            .clone()
            .unwrap_or_else(|| format!("{}@{}:{}", self.username, self.host, self.port()))
    }

    /// Returns the command timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Builds the POP3 connection parameters.
    #[must_use]
    pub fn connection(&self) -> Config {
        Config::builder(self.host.clone())
            .port(self.port())
            .security(self.security())
            .accept_invalid_certs(self.allow_unauthorized_certs)
            .credentials(self.username.clone(), self.password.clone())
            .timeout(self.timeout())
            .build()
    }
}

// Manual Debug implementation so the password never reaches the logs
impl fmt::Debug for PollerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollerConfig")
            .field("mailbox", &self.mailbox)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("allow_unauthorized_certs", &self.allow_unauthorized_certs)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("limit", &self.limit)
            .field("emit_on_start", &self.emit_on_start)
            .field("delete_after_emit", &self.delete_after_emit)
            .finish()
    }
}
