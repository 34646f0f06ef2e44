//! Typed handles for talking to the facility's actors.

pub mod shelf_pool_client;

pub use shelf_pool_client::*;
