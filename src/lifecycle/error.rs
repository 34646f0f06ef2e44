//! Errors surfaced by the facility to its callers.

use crate::config::ConfigError;
use crate::model::OrderError;
use crate::shelf_pool::PoolError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FacilityError {
    /// The intake payload was invalid; nothing was placed.
    #[error(transparent)]
    Rejected(#[from] OrderError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A stage asked for a successor that was never configured.
    #[error("Pipeline not wired: stage '{0}' has no next stage")]
    PipelineNotWired(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A facility task panicked or was aborted.
    #[error("Facility task failed: {0}")]
    TaskFailed(String),
}
