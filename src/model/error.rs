//! Error types for order intake.

use thiserror::Error;

/// Reasons an inbound order payload is rejected before it reaches the pool.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The temperature class is not one of `hot`, `cold` or `frozen`.
    #[error("Can't find supported shelf that corresponds to label {0}")]
    UnknownTemperature(String),

    /// Shelf life must be a positive, finite number.
    #[error("Invalid shelf life: {0}")]
    InvalidShelfLife(f64),

    /// Decay rate must be a non-negative, finite number.
    #[error("Invalid decay rate: {0}")]
    InvalidDecayRate(f64),
}
