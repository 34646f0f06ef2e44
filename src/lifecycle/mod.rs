//! Facility assembly, shutdown and process-wide tracing setup.

pub mod error;
pub mod facility;
pub mod tracing;

pub use error::*;
pub use facility::*;
pub use self::tracing::setup_tracing;
