//! Identifier types shared across the engine.

mod ids;

pub use ids::{PageId, RecordId, TxnId};
