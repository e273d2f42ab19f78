//! Error types for the Dialclock engine.

use thiserror::Error;

/// Errors surfaced to callers configuring a `TimeEmitter`.
///
/// None of these are fatal. A rejected call leaves the emitter exactly as it
/// was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClockError {
    #[error("Interval must be a positive, finite number of seconds (got {seconds})")]
    InvalidInterval { seconds: f64 },

    #[error("Interval tolerance must be a non-negative, finite number of seconds (got {tolerance})")]
    InvalidTolerance { tolerance: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("The emitter can only be started from within a Tokio runtime")]
    NoRuntime,
}

/// A time component that a computation required but the sample did not carry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Time sample is missing its {field} component")]
pub struct FieldError {
    pub field: &'static str,
}

impl From<config::ConfigError> for ClockError {
    fn from(err: config::ConfigError) -> Self {
        ClockError::Config(err.to_string())
    }
}
