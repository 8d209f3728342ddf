//! Error handling for NexusDB.
//!
//! Crates keep their own error enums and convert into `NexusError` at
//! their public boundary. `ErrorCode` is the shared, stable taxonomy.

mod database;

pub use database::{ErrorCode, NexusError};

/// Result type alias for NexusDB operations.
pub type NexusResult<T> = std::result::Result<T, NexusError>;
