//! Configuration validation.

use super::model::PollerConfig;

/// Shortest allowed poll interval, in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;

/// Largest allowed per-cycle message limit.
pub const MAX_LIMIT: usize = 50;

/// Validation error for poller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Host is empty.
    EmptyHost,
    /// Port is zero.
    InvalidPort,
    /// Username is empty.
    EmptyUsername,
    /// Timeout is zero.
    InvalidTimeout,
    /// Poll interval below the minimum.
    PollIntervalTooShort,
    /// Limit outside 1..=50.
    InvalidLimit,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyHost => "POP3 host is required",
            Self::InvalidPort => "Port must be 1-65535",
            Self::EmptyUsername => "Username is required",
            Self::InvalidTimeout => "Timeout must be at least 1 second",
            Self::PollIntervalTooShort => "Poll interval must be at least 10 seconds",
            Self::InvalidLimit => "Limit must be 1-50",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyHost => "host",
            Self::InvalidPort => "port",
            Self::EmptyUsername => "username",
            Self::InvalidTimeout => "timeout_secs",
            Self::PollIntervalTooShort => "poll_interval_secs",
            Self::InvalidLimit => "limit",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a configuration.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a poller configuration.
///
/// Returns all validation errors found, not just the first one.
///
/// # Errors
///
/// Returns a vector of validation errors if the configuration is invalid.
pub fn validate_config(config: &PollerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.port == Some(0) {
        errors.push(ValidationError::InvalidPort);
    }
    if config.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }
    if config.timeout_secs == 0 {
        errors.push(ValidationError::InvalidTimeout);
    }
    if config.poll_interval_secs < MIN_POLL_INTERVAL_SECS {
        errors.push(ValidationError::PollIntervalTooShort);
    }
    if !(1..=MAX_LIMIT).contains(&config.limit) {
        errors.push(ValidationError::InvalidLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl PollerConfig {
    /// Checks every rule, returning all violations.
    ///
    /// # Errors
    ///
    /// Returns the list of violated rules.
    pub fn validate(&self) -> ValidationResult {
        validate_config(self)
    }
}

/// Validate a configuration, folding all problems into one error.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] listing every problem found.
pub fn ensure_valid(config: &PollerConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let details: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.field(), e.message()))
            .collect();
        crate::Error::Config(details.join("; "))
    })
}
