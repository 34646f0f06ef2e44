//! Error types for the shelf pool.

use crate::model::OrderId;
use thiserror::Error;

/// Errors returned by shelf pool operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PoolError {
    /// Neither the home shelf nor the overflow shelf has a free slot.
    #[error("No space left in shelves")]
    NoSpace,

    /// No shelf holds an order with this id (already picked up or reclaimed).
    #[error("No order found for id: {0}")]
    OrderNotFound(OrderId),

    /// The order is still on a shelf but its health already reached zero.
    #[error("Order {0} has expired")]
    OrderExpired(OrderId),

    /// The pool actor is no longer running.
    #[error("Shelf pool closed")]
    ActorClosed,

    /// The pool actor dropped the response channel.
    #[error("Shelf pool dropped response channel")]
    ActorDropped,
}
