//! Configuration error type.
//!
//! The simulation itself never fails: degenerate inputs are clamped. Only
//! loading and validating tuning/settings data can produce an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field}: min {min} is greater than max {max}")]
    InvertedBand {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f32 },

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
