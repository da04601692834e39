//! Poller configuration.
//!
//! Provides the configuration model and its validation rules.

mod model;
mod validation;

pub use model::{DEFAULT_LIMIT, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS, PollerConfig};
pub use validation::{
    MAX_LIMIT, MIN_POLL_INTERVAL_SECS, ValidationError, ValidationResult, ensure_valid,
    validate_config,
};
