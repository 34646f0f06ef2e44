//! Error types for pickup requests.

use crate::model::OrderId;
use crate::shelf_pool::PoolError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CourierError {
    /// The courier was created without a simulation config, so it cannot travel.
    #[error("No simulation config found")]
    NoSimulationConfig,

    /// The courier has no shelf pool to retrieve from.
    #[error("No storage facility configured")]
    NoStorageFacility,

    #[error(transparent)]
    Retrieval(#[from] PoolError),

    /// The pool handed back a different order than the one requested.
    #[error("Given order is not the same as requested: requested {requested}, received {received}")]
    OrderMismatch { requested: OrderId, received: OrderId },

    /// The journey ended without reporting an outcome.
    #[error("Courier abandoned the pickup")]
    Abandoned,
}
