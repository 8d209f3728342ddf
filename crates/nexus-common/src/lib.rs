//! # nexus-common
//!
//! Common types and errors shared by the NexusDB execution crates.
//!
//! - **Types**: identifiers for pages, records, and transactions
//! - **Errors**: the stable `ErrorCode` taxonomy and the boundary error `NexusError`
//!
//! ## Example
//!
//! ```rust
//! use nexus_common::types::{PageId, RecordId, TxnId};
//! use nexus_common::error::NexusResult;
//!
//! fn example() -> NexusResult<()> {
//!     let rid = RecordId::new(PageId::new(3), 7);
//!     let txn_id = TxnId::new(1);
//!     assert!(txn_id.is_valid());
//!     assert_eq!(rid.slot(), 7);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

pub use error::{ErrorCode, NexusError, NexusResult};
pub use types::{PageId, RecordId, TxnId};
