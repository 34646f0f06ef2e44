//! Pure data structures shared by the pool, the decay processes and the couriers.

pub mod error;
pub mod order;
pub mod shelf;
pub mod snapshot;

pub use error::*;
pub use order::*;
pub use shelf::*;
pub use snapshot::*;
